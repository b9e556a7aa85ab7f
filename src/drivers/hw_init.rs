//! One-shot peripheral initialisation that `esp-idf-hal` does not cover.
//!
//! Configures the ADC1 oneshot unit for the TDS sensor using raw ESP-IDF
//! sys calls.  Called once from `main()` before the scheduler starts.
//! Relay and gauge GPIOs are owned through `PinDriver`s instead.  Host
//! builds read the simulated ADC in [`crate::sensors::tds`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::error::SensorError;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static ADC1_HANDLE: core::sync::atomic::AtomicPtr<adc_oneshot_unit_ctx_t> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

/// Bring up ADC1 and configure `channel` for 12-bit reads over 0 – 3.3 V.
#[cfg(target_os = "espidf")]
pub fn init_adc(channel: u32) -> Result<(), HwInitError> {
    use core::sync::atomic::Ordering;

    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    // SAFETY: called once from main() before any reader exists.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: `handle` was just created by adc_oneshot_new_unit.
    let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    ADC1_HANDLE.store(handle, Ordering::Release);
    log::info!("hw_init: ADC1 CH{} configured (TDS)", channel);
    Ok(())
}

/// One raw 12-bit conversion.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    use core::sync::atomic::Ordering;

    let handle = ADC1_HANDLE.load(Ordering::Acquire);
    if handle.is_null() {
        return Err(SensorError::AdcReadFailed);
    }
    let mut raw: i32 = 0;
    // SAFETY: the handle is initialised and only the TDS job reads it.
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}
