use std::net::Ipv4Addr;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    // Matches "time=12ms", "time<1ms", "tiempo=12ms", "time=12.3 ms"
    static ref PING_LATENCY: Regex =
        Regex::new(r"(?i)(?:time|tiempo)\s*[=<]\s*([0-9]+(?:\.[0-9]+)?)\s*ms")
            .expect("ping latency pattern");
    static ref IPV4: Regex = Regex::new(r"\b(\d{1,3}(?:\.\d{1,3}){3})\b").expect("ipv4 pattern");
}

/// Maps a finished command onto a probe result: success needs a zero exit
/// status and some output.
pub fn command_result(success: bool, payload: &str, error: &str) -> Result<Value, String> {
    let payload = payload.trim();
    if !success {
        let error = error.trim();
        return Err(if error.is_empty() {
            "command exited with an error".to_string()
        } else {
            first_line(error).to_string()
        });
    }
    if payload.is_empty() {
        return Err("command produced no output".to_string());
    }
    Ok(Value::String(payload.to_string()))
}

/// Round-trip latency in milliseconds from one `ping` reply line.
pub fn ping_latency_ms(output: &str) -> Option<f64> {
    PING_LATENCY
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Gateway from `ip route show default`: `default via 192.168.1.1 dev eth0`.
pub fn ip_route_gateway(output: &str) -> Option<String> {
    route_field(output, "via")
}

/// Interface from `ip route show default`.
pub fn ip_route_device(output: &str) -> Option<String> {
    route_field(output, "dev")
}

fn route_field(output: &str, key: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("default"))
        .find_map(|line| {
            let mut words = line.split_whitespace();
            while let Some(word) = words.next() {
                if word == key {
                    return words.next().map(str::to_string);
                }
            }
            None
        })
}

/// First non-empty IPv4 gateway from `ipconfig` output, English or Spanish
/// locale. Continuation lines after the label are also considered.
pub fn ipconfig_gateway(output: &str) -> Option<String> {
    let mut in_gateway = false;
    for line in output.lines() {
        let lower = line.to_lowercase();
        let is_label = lower.contains("default gateway") || lower.contains("puerta de enlace");
        if is_label {
            in_gateway = true;
            if let Some((_, value)) = line.split_once(':') {
                if let Some(ip) = first_ipv4(value) {
                    return Some(ip);
                }
            }
            continue;
        }
        if in_gateway {
            if line.contains(':') && !line.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
                in_gateway = false;
                continue;
            }
            if let Some(ip) = first_ipv4(line) {
                return Some(ip);
            }
        }
    }
    None
}

/// Gateway from `route -n get default` (macOS/BSD).
pub fn bsd_route_gateway(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "gateway").then(|| value.trim().to_string())
    })
}

pub fn resolv_conf_nameservers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.strip_prefix("nameserver"))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Device names from `lspci` display-controller lines.
pub fn lspci_display_controllers(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains("VGA compatible controller") || line.contains("3D controller"))
        .filter_map(|line| line.splitn(3, ": ").nth(1).or_else(|| line.rsplit(": ").next()))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// `system_profiler SPDisplaysDataType` chipset names (macOS).
pub fn profiler_chipsets(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Chipset Model:"))
        .map(|name| name.trim().to_string())
        .collect()
}

/// `/sys/class/net/<if>/speed` holds Mbps, or -1 when the link is down.
pub fn sysfs_link_speed(raw: &str) -> Option<String> {
    let mbps: i64 = raw.trim().parse().ok()?;
    if mbps <= 0 {
        return None;
    }
    Some(if mbps >= 1000 && mbps % 1000 == 0 {
        format!("{} Gbps", mbps / 1000)
    } else {
        format!("{} Mbps", mbps)
    })
}

pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

pub fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_ipv4(text: &str) -> Option<String> {
    IPV4.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find(|m| m.as_str().parse::<Ipv4Addr>().is_ok())
        .map(|m| m.as_str().to_string())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}
