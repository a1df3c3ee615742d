use std::net::UdpSocket;

use serde_json::Value;
use tokio::process::Command;

use super::parse;

/// Runs a command to completion and maps it through the probe boundary.
/// The child is killed if the probe is dropped on timeout or cancellation.
pub(super) async fn run_command(program: &str, args: &[&str]) -> Result<Value, String> {
    let mut command = Command::new(program);
    command.args(args);
    command.kill_on_drop(true);
    #[cfg(windows)]
    {
        // CREATE_NO_WINDOW keeps a console from flashing up under a GUI host.
        command.creation_flags(0x0800_0000);
    }
    let output = command
        .output()
        .await
        .map_err(|e| format!("failed to execute {}: {}", program, e))?;
    parse::command_result(
        output.status.success(),
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    )
}

#[cfg(windows)]
async fn powershell(script: &str) -> Result<Value, String> {
    let wrapped = format!(
        "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; {}",
        script
    );
    run_command(
        "powershell",
        &["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", &wrapped],
    )
    .await
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lines_value(lines: Vec<String>, what: &str) -> Result<Value, String> {
    if lines.is_empty() {
        Err(format!("no {} found", what))
    } else if lines.len() == 1 {
        Ok(Value::String(lines.into_iter().next().unwrap_or_default()))
    } else {
        Ok(Value::Array(lines.into_iter().map(Value::String).collect()))
    }
}

pub(super) async fn motherboard() -> Result<Value, String> {
    #[cfg(windows)]
    {
        powershell(
            "Get-CimInstance Win32_BaseBoard | ForEach-Object { \"$($_.Manufacturer) $($_.Product)\" }",
        )
        .await
    }
    #[cfg(target_os = "linux")]
    {
        let read = |file: &str| {
            std::fs::read_to_string(format!("/sys/class/dmi/id/{}", file))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let board = format!("{} {}", read("board_vendor"), read("board_name"));
        let board = board.trim();
        if board.is_empty() {
            Err("board information unavailable".to_string())
        } else {
            Ok(Value::String(board.to_string()))
        }
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    {
        run_command("sysctl", &["-n", "hw.model"]).await
    }
}

pub(super) async fn graphics() -> Result<Value, String> {
    #[cfg(windows)]
    {
        let raw = powershell("Get-CimInstance Win32_VideoController | ForEach-Object { $_.Name }")
            .await?;
        lines_value(parse::non_empty_lines(&text_of(raw)), "video controller")
    }
    #[cfg(target_os = "linux")]
    {
        let raw = run_command("lspci", &[]).await?;
        lines_value(parse::lspci_display_controllers(&text_of(raw)), "display controller")
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    {
        let raw = run_command("system_profiler", &["SPDisplaysDataType"]).await?;
        lines_value(parse::profiler_chipsets(&text_of(raw)), "display chipset")
    }
}

pub(super) async fn domain() -> Result<Value, String> {
    #[cfg(windows)]
    {
        std::env::var("USERDOMAIN")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .map(|d| Value::String(d.trim().to_string()))
            .ok_or_else(|| "USERDOMAIN not set".to_string())
    }
    #[cfg(not(windows))]
    {
        run_command("hostname", &["-d"]).await
    }
}

pub(super) async fn antivirus() -> Result<Value, String> {
    #[cfg(windows)]
    {
        let raw = powershell(
            "Get-CimInstance -Namespace root/SecurityCenter2 -ClassName AntiVirusProduct | ForEach-Object { $_.displayName }",
        )
        .await?;
        lines_value(parse::non_empty_lines(&text_of(raw)), "antivirus product")
    }
    #[cfg(not(windows))]
    {
        Err("antivirus status is only reported on Windows".to_string())
    }
}

pub(super) async fn link_speed() -> Result<Value, String> {
    #[cfg(windows)]
    {
        powershell(
            "Get-NetAdapter | Where-Object Status -eq 'Up' | Select-Object -First 1 -ExpandProperty LinkSpeed",
        )
        .await
    }
    #[cfg(target_os = "linux")]
    {
        let route = run_command("ip", &["route", "show", "default"]).await?;
        let device = parse::ip_route_device(&text_of(route))
            .ok_or_else(|| "no default route".to_string())?;
        let raw = std::fs::read_to_string(format!("/sys/class/net/{}/speed", device))
            .map_err(|e| format!("link speed unavailable for {}: {}", device, e))?;
        parse::sysfs_link_speed(&raw)
            .map(Value::String)
            .ok_or_else(|| format!("link down on {}", device))
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err("link speed is not reported on this platform".to_string())
    }
}

pub(super) async fn gateway() -> Result<Value, String> {
    #[cfg(windows)]
    let found = parse::ipconfig_gateway(&text_of(run_command("ipconfig", &[]).await?));
    #[cfg(target_os = "linux")]
    let found = parse::ip_route_gateway(&text_of(
        run_command("ip", &["route", "show", "default"]).await?,
    ));
    #[cfg(not(any(windows, target_os = "linux")))]
    let found = parse::bsd_route_gateway(&text_of(
        run_command("route", &["-n", "get", "default"]).await?,
    ));

    found
        .map(Value::String)
        .ok_or_else(|| "no default gateway".to_string())
}

pub(super) async fn dns_servers() -> Result<Value, String> {
    #[cfg(windows)]
    {
        let raw = powershell(
            "Get-DnsClientServerAddress -AddressFamily IPv4 | Select-Object -ExpandProperty ServerAddresses | Sort-Object -Unique",
        )
        .await?;
        lines_value(parse::non_empty_lines(&text_of(raw)), "DNS server")
    }
    #[cfg(not(windows))]
    {
        let contents = std::fs::read_to_string("/etc/resolv.conf")
            .map_err(|e| format!("failed to read /etc/resolv.conf: {}", e))?;
        lines_value(parse::resolv_conf_nameservers(&contents), "DNS server")
    }
}

/// Local address the OS would route `target` through. Connecting a UDP
/// socket sends no packets.
pub(super) fn local_ip(target: &str) -> Result<Value, String> {
    let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| format!("bind failed: {}", e))?;
    socket
        .connect((target, 53))
        .map_err(|e| format!("no route to {}: {}", target, e))?;
    let addr = socket
        .local_addr()
        .map_err(|e| format!("local address unavailable: {}", e))?;
    if addr.ip().is_unspecified() {
        return Err("no local address assigned".to_string());
    }
    Ok(Value::String(addr.ip().to_string()))
}

pub(super) async fn ping(target: &str) -> Result<Value, String> {
    #[cfg(windows)]
    let args = ["-n", "1", target];
    #[cfg(not(windows))]
    let args = ["-c", "1", target];

    let raw = run_command("ping", &args)
        .await
        .map_err(|_| format!("no reply from {}", target))?;
    Ok(Value::String(match parse::ping_latency_ms(&text_of(raw)) {
        Some(ms) => format!("online, {} ms", ms),
        None => "online".to_string(),
    }))
}
