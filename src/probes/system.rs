use std::path::Path;

use bytesize::ByteSize;
use chrono::{DateTime, Local};
use serde_json::Value;
use sysinfo::{Disks, Networks, System};

use super::parse::format_uptime;

pub(super) fn os_version() -> Result<Value, String> {
    let name = System::long_os_version()
        .or_else(System::name)
        .ok_or_else(|| "operating system name unavailable".to_string())?;
    Ok(match System::kernel_version() {
        Some(kernel) if !name.contains(&kernel) => Value::String(format!("{} (kernel {})", name, kernel)),
        _ => Value::String(name),
    })
}

pub(super) fn cpu_model() -> Result<Value, String> {
    let mut system = System::new();
    system.refresh_cpu();
    let cpus = system.cpus();
    if cpus.is_empty() {
        return Err("cpu list empty".to_string());
    }
    let brand = cpus
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "unknown processor".to_string());
    let cores = match system.physical_core_count() {
        Some(physical) => format!("{} cores / {} threads", physical, cpus.len()),
        None => format!("{} threads", cpus.len()),
    };
    Ok(Value::String(format!("{} ({})", brand, cores)))
}

pub(super) fn memory_total() -> Result<Value, String> {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();
    if total == 0 {
        return Err("total memory reported as zero".to_string());
    }
    Ok(Value::String(ByteSize::b(total).to_string()))
}

pub(super) fn disk_usage() -> Result<Value, String> {
    let disks = Disks::new_with_refreshed_list();
    let lines: Vec<Value> = disks
        .list()
        .iter()
        .filter(|disk| disk.total_space() > 0)
        .map(|disk| {
            let total_space = disk.total_space();
            let used_space = total_space.saturating_sub(disk.available_space());
            let mount_point = disk.mount_point().to_string_lossy().to_string();
            let system_marker = if Path::new(&mount_point) == Path::new("/")
                || mount_point.eq_ignore_ascii_case("C:\\")
            {
                " [system]"
            } else {
                ""
            };
            Value::String(format!(
                "{} {} used of {} ({}){}",
                mount_point,
                ByteSize::b(used_space),
                ByteSize::b(total_space),
                disk.file_system().to_string_lossy(),
                system_marker
            ))
        })
        .collect();
    if lines.is_empty() {
        return Err("no disks discovered".to_string());
    }
    Ok(Value::Array(lines))
}

pub(super) fn uptime() -> Result<Value, String> {
    let seconds = System::uptime();
    if seconds == 0 {
        return Err("uptime unavailable".to_string());
    }
    Ok(Value::String(format_uptime(seconds)))
}

pub(super) fn last_boot() -> Result<Value, String> {
    let boot = System::boot_time();
    let at = DateTime::from_timestamp(boot as i64, 0)
        .filter(|_| boot > 0)
        .ok_or_else(|| "boot time unavailable".to_string())?;
    Ok(Value::String(
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    ))
}

pub(super) fn user_name() -> Result<Value, String> {
    ["USERNAME", "USER", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(Value::String)
        .ok_or_else(|| "no user name in environment".to_string())
}

/// Busiest non-loopback interface with a real hardware address.
pub(super) fn primary_interface() -> Option<(String, String)> {
    let networks = Networks::new_with_refreshed_list();
    networks
        .iter()
        .filter(|(name, _)| !is_loopback(name))
        .filter(|(_, data)| !data.mac_address().is_unspecified())
        .max_by_key(|(_, data)| data.total_received() + data.total_transmitted())
        .map(|(name, data)| (name.clone(), data.mac_address().to_string()))
}

pub(super) fn interface_name() -> Result<Value, String> {
    primary_interface()
        .map(|(name, _)| Value::String(name))
        .ok_or_else(|| "no active network interface".to_string())
}

pub(super) fn interface_mac() -> Result<Value, String> {
    primary_interface()
        .map(|(_, mac)| Value::String(mac.to_uppercase()))
        .ok_or_else(|| "no active network interface".to_string())
}

pub fn host_identity() -> String {
    System::host_name()
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

fn is_loopback(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "lo" || lower.starts_with("lo0") || lower.contains("loopback")
}
