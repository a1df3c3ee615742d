mod parse;
mod platform;
mod system;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use log::debug;

use crate::catalog::FIELDS;
use crate::collector::{Probe, ProbeRegistry};
use crate::config::AuditConfig;
use crate::error::RegistryError;

pub use parse::command_result;
pub use system::host_identity;

/// Builds the platform probe for one catalog key, with its configured
/// timeout.
pub fn builtin_probe(key: &str, config: &AuditConfig) -> Option<Probe> {
    let timeout = config.timeout_for(key);
    let probe = match key {
        "user" => Probe::blocking(key, timeout, system::user_name),
        "domain" => Probe::new(key, timeout, platform::domain),
        "av" => Probe::new(key, timeout, platform::antivirus),
        "uptime" => Probe::blocking(key, timeout, system::uptime),
        "reboot" => Probe::blocking(key, timeout, system::last_boot),
        "os" => Probe::blocking(key, timeout, system::os_version),
        "mobo" => Probe::new(key, timeout, platform::motherboard),
        "cpu" => Probe::blocking(key, timeout, system::cpu_model),
        "ram" => Probe::blocking(key, timeout, system::memory_total),
        "vga" => Probe::new(key, timeout, platform::graphics),
        "disk" => Probe::blocking(key, timeout, system::disk_usage),
        "net_name" => Probe::blocking(key, timeout, system::interface_name),
        "net_mac" => Probe::blocking(key, timeout, system::interface_mac),
        "net_speed" => Probe::new(key, timeout, platform::link_speed),
        "net_ip" => {
            let target: Arc<str> = Arc::from(config.ping_target.as_str());
            Probe::blocking(key, timeout, move || platform::local_ip(&target))
        }
        "net_gw" => Probe::new(key, timeout, platform::gateway),
        "net_dns" => Probe::new(key, timeout, platform::dns_servers),
        "net_ping" => {
            let target: Arc<str> = Arc::from(config.ping_target.as_str());
            Probe::new(key, timeout, move || {
                let target = Arc::clone(&target);
                async move { platform::ping(&target).await }
            })
        }
        _ => return None,
    };
    Some(probe)
}

/// Every catalog probe not disabled in `config`.
pub fn default_registry(config: &AuditConfig) -> Result<ProbeRegistry, RegistryError> {
    let mut registry = ProbeRegistry::new();
    for spec in FIELDS {
        if !config.is_enabled(spec.key) {
            debug!("probe {} disabled by config", spec.key);
            continue;
        }
        if let Some(probe) = builtin_probe(spec.key, config) {
            registry.register(probe)?;
        }
    }
    Ok(registry)
}
