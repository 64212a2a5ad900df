//! WiFi station-mode adapter.
//!
//! Implements the [`ConnectivityPort`] boundary for network connectivity
//! and provides [`join_blocking`], the boot-time join
//! loop that blinks the status LED until the station is up.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info};

use crate::drivers::status_led::StatusLed;

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("station has no SSID set"),
            Self::InvalidSsid => f.write_str("SSID must be 1..=32 printable ASCII bytes"),
            Self::InvalidPassword => f.write_str("WPA2 passphrase must be 8..=64 bytes"),
            Self::ConnectionFailed => f.write_str("WiFi driver refused the join"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

pub trait ConnectivityPort {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    /// Start associating with the access point.  Does not wait.
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    /// Associated and holding an IP address.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// SSID: 1-32 printable ASCII bytes.  Password: empty (open network) or
/// 8-64 bytes (WPA2).
fn check_credentials(ssid: &str, password: &str) -> Result<(), ConnectivityError> {
    let printable = ssid.bytes().all(|b| b.is_ascii_graphic() || b == b' ');
    if !(1..=32).contains(&ssid.len()) || !printable {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Blocking join
// ───────────────────────────────────────────────────────────────

/// Start the join and poll every `poll_ms` until the station is up,
/// toggling `led` on each poll.  Waits indefinitely; returns the number
/// of polls it took.
pub fn join_blocking<W, P, D>(
    wifi: &mut W,
    led: &mut StatusLed<P>,
    delay: &mut D,
    poll_ms: u32,
) -> Result<u32, ConnectivityError>
where
    W: ConnectivityPort + ?Sized,
    P: OutputPin,
    D: DelayNs,
{
    if wifi.is_connected() {
        return Ok(0);
    }
    wifi.connect()?;

    let mut polls = 0u32;
    while !wifi.is_connected() {
        delay.delay_ms(poll_ms);
        led.toggle();
        polls = polls.wrapping_add(1);
        debug!("WiFi: waiting for link ({} polls)", polls);
    }
    info!("WiFi: connected after {} polls", polls);
    Ok(polls)
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    /// A join was started and not torn down since.
    joined: bool,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::EspWifi<'static>,
    /// Simulation: `is_connected()` calls left before the link comes up.
    #[cfg(not(target_os = "espidf"))]
    sim_polls_left: core::cell::Cell<u32>,
    #[cfg(not(target_os = "espidf"))]
    sim_polls_until_up: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            joined: false,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            driver,
        }
    }

    /// Simulated station that comes up after three polls.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self::simulated(3)
    }

    /// Simulated station that comes up after `polls` link checks.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(polls: u32) -> Self {
        Self {
            joined: false,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_polls_left: core::cell::Cell::new(polls),
            sim_polls_until_up: polls,
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            error!("WiFi(espidf): driver error {e}");
            ConnectivityError::ConnectionFailed
        };
        self.driver.set_configuration(&config).map_err(fail)?;
        if !self.driver.is_started().map_err(fail)? {
            self.driver.start().map_err(fail)?;
        }
        self.driver.connect().map_err(fail)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim_polls_left.set(self.sim_polls_until_up);
        info!("WiFi(sim): associating with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            debug!("WiFi(espidf): disconnect: {e}");
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        debug!("WiFi(sim): link torn down");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        match self.sim_polls_left.get() {
            0 => true,
            n => {
                self.sim_polls_left.set(n - 1);
                false
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        check_credentials(ssid, password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| ConnectivityError::InvalidPassword)?;
        debug!("WiFi: station credentials set for '{}'", self.ssid);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        info!("WiFi: joining '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.joined = true;
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.joined = false;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.joined = false;
        info!("WiFi: left network");
    }

    fn is_connected(&self) -> bool {
        self.joined && self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
