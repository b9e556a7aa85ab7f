//! WiFi station-mode adapter.
//!
//! Credentials are baked in at build time (`RESERVOIR_WIFI_SSID`,
//! `RESERVOIR_WIFI_PASS`) and validated before the radio is touched.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` STA bring-up.
//! - **all other targets**: credential handling and the backoff policy
//!   only, for host-side tests.
//!
//! ## Reconnection policy
//!
//! A failed join waits an exponential backoff (2 s → 4 s → 8 s … capped
//! at 60 s) before retrying.  The controller keeps running throughout;
//! only the control surface is unreachable.

use core::fmt;

use heapless::String;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// ESP-IDF error code from the WiFi driver.
    Platform(i32),
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::Platform(rc) => write!(f, "WiFi driver error (rc={})", rc),
        }
    }
}

impl core::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: String<32>,
    password: String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(ConnectivityError::InvalidPassword);
        }
        let ssid = String::try_from(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        let password = String::try_from(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(Self { ssid, password })
    }

    /// Credentials compiled into this firmware image.
    pub fn from_build_env() -> Result<Self, ConnectivityError> {
        match option_env!("RESERVOIR_WIFI_SSID") {
            Some(ssid) => Self::new(ssid, option_env!("RESERVOIR_WIFI_PASS").unwrap_or("")),
            None => Err(ConnectivityError::NoCredentials),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Backoff
// ───────────────────────────────────────────────────────────────

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    attempt: u32,
    next_secs: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    pub const fn new() -> Self {
        Self {
            attempt: 0,
            next_secs: INITIAL_BACKOFF_SECS,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next retry; doubles on every call up to the cap.
    pub fn next_delay_secs(&mut self) -> u32 {
        let delay = self.next_secs;
        self.attempt = self.attempt.saturating_add(1);
        self.next_secs = (self.next_secs * 2).min(MAX_BACKOFF_SECS);
        delay
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ───────────────────────────────────────────────────────────────
// Station bring-up (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod station {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{Backoff, ConnectivityError, WifiCredentials};

    fn platform(e: EspError) -> ConnectivityError {
        ConnectivityError::Platform(e.code())
    }

    /// Start the STA and block until an IP is assigned.  Retries the join
    /// with [`Backoff`] forever; only driver construction errors return.
    pub fn connect(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        creds: &WifiCredentials,
    ) -> Result<BlockingWifi<EspWifi<'static>>, ConnectivityError> {
        let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(platform)?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(platform)?;

        let auth_method = if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: creds.ssid().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: creds.password().try_into().map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        };
        wifi.set_configuration(&Configuration::Client(client)).map_err(platform)?;
        wifi.start().map_err(platform)?;

        let mut backoff = Backoff::new();
        loop {
            info!("WiFi: joining '{}' (attempt {})", creds.ssid(), backoff.attempt() + 1);
            match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
                Ok(()) => break,
                Err(e) => {
                    let secs = backoff.next_delay_secs();
                    warn!("WiFi: join failed ({}), retry in {}s", e, secs);
                    std::thread::sleep(std::time::Duration::from_secs(u64::from(secs)));
                }
            }
        }

        match wifi.wifi().sta_netif().get_ip_info() {
            Ok(ip) => info!("WiFi: connected, ip={}", ip.ip),
            Err(e) => warn!("WiFi: connected, ip unavailable ({})", e),
        }
        Ok(wifi)
    }
}

#[cfg(target_os = "espidf")]
pub use station::connect;

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
