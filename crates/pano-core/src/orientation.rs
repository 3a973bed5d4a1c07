//! Device-orientation sampling and calibration.
//!
//! The sampler keeps only the most recent event (last write wins, no
//! smoothing) and the calibration offset that maps "facing forward" to zero.

/// One raw `deviceorientation` event. Platforms report `null` axes when the
/// sensor is missing or not yet warmed up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawOrientation {
    pub alpha: Option<f32>,
    pub beta: Option<f32>,
    pub gamma: Option<f32>,
}

/// A complete sample in degrees: yaw (alpha), pitch (beta), roll (gamma).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationSample {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl OrientationSample {
    pub const ZERO: Self = Self {
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };

    pub fn from_raw(raw: RawOrientation) -> Option<Self> {
        match (raw.alpha, raw.beta, raw.gamma) {
            (Some(yaw), Some(pitch), Some(roll))
                if yaw.is_finite() && pitch.is_finite() && roll.is_finite() =>
            {
                Some(Self { yaw, pitch, roll })
            }
            _ => None,
        }
    }

    /// `self - offset`, with the yaw difference wrapped into (-180, 180].
    pub fn relative_to(self, offset: Self) -> Self {
        Self {
            yaw: wrap_deg_signed(self.yaw - offset.yaw),
            pitch: self.pitch - offset.pitch,
            roll: self.roll - offset.roll,
        }
    }
}

#[inline]
pub fn wrap_deg_signed(deg: f32) -> f32 {
    let w = deg.rem_euclid(360.0);
    if w > 180.0 {
        w - 360.0
    } else {
        w
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Requesting,
    Granted,
    Denied,
    Unsupported,
}

/// Result of the platform permission prompt, or its absence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// The platform has no explicit grant step.
    NotRequired,
    Granted,
    Denied,
    Unsupported,
}

#[derive(Clone, Debug)]
pub struct OrientationSampler {
    permission: PermissionState,
    enabled: bool,
    latest: Option<OrientationSample>,
    offset: Option<OrientationSample>,
    auto_calibrated: bool,
}

impl Default for OrientationSampler {
    fn default() -> Self {
        Self::mount()
    }
}

impl OrientationSampler {
    pub fn mount() -> Self {
        Self {
            permission: PermissionState::Unknown,
            enabled: true,
            latest: None,
            offset: None,
            auto_calibrated: false,
        }
    }

    pub fn begin_permission_request(&mut self) {
        self.permission = PermissionState::Requesting;
    }

    /// Never fails: a refusal only means no samples will arrive, and the
    /// camera keeps using pointer drag.
    pub fn on_permission(&mut self, outcome: PermissionOutcome) {
        self.permission = match outcome {
            PermissionOutcome::NotRequired | PermissionOutcome::Granted => {
                log::info!("[gyro] orientation events available");
                PermissionState::Granted
            }
            PermissionOutcome::Denied => {
                log::warn!("[gyro] orientation permission denied; using pointer drag");
                PermissionState::Denied
            }
            PermissionOutcome::Unsupported => {
                log::warn!("[gyro] orientation events unsupported; using pointer drag");
                PermissionState::Unsupported
            }
        };
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// Whether the platform event source should currently be subscribed.
    pub fn wants_subscription(&self) -> bool {
        self.enabled && self.permission == PermissionState::Granted
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.latest = None;
        }
    }

    /// Replace the current sample with `raw`. The first complete sample after
    /// mount becomes the calibration offset.
    pub fn record(&mut self, raw: RawOrientation) {
        if !self.enabled {
            return;
        }
        self.latest = OrientationSample::from_raw(raw);
        if let Some(sample) = self.latest {
            if !self.auto_calibrated {
                self.offset = Some(sample);
                self.auto_calibrated = true;
                log::info!(
                    "[gyro] auto-calibrated at yaw={:.1} pitch={:.1} roll={:.1}",
                    sample.yaw,
                    sample.pitch,
                    sample.roll
                );
            }
        }
    }

    /// Make the current sample the new zero. Returns `false` (offset
    /// unchanged) when there is no sample to capture.
    pub fn recalibrate(&mut self) -> bool {
        match self.latest {
            Some(sample) => {
                self.offset = Some(sample);
                log::info!("[gyro] recalibrated");
                true
            }
            None => false,
        }
    }

    pub fn latest(&self) -> Option<OrientationSample> {
        self.latest
    }

    pub fn offset(&self) -> Option<OrientationSample> {
        self.offset
    }

    /// Current sample minus the calibration offset.
    pub fn calibrated(&self) -> Option<OrientationSample> {
        let sample = self.latest?;
        Some(sample.relative_to(self.offset.unwrap_or(OrientationSample::ZERO)))
    }

    /// Tear down: the next mount calibrates afresh.
    pub fn unmount(&mut self) {
        self.latest = None;
        self.offset = None;
        self.auto_calibrated = false;
        self.permission = PermissionState::Unknown;
    }
}
