//! `PowerStage` trait for the drivetrain power-stage lines: the
//! power-stage-ready digital input and the motor-enable digital output.

use panther_types::PowerError;

/// Digital lines that gate power to the motor controllers.
///
/// Drivers implement this trait; the power controller never sees pin numbers
/// or register access.  Any `Err` returned here is a hardware-access failure
/// and is treated as fatal by the caller.
pub trait PowerStage: Send {
    /// Sample the power-stage-ready line (`true` = safe to enable motors).
    ///
    /// Has no side effects on the outputs but may block briefly on the
    /// physical interface.
    ///
    /// # Errors
    ///
    /// Returns [`PowerError::HardwareFault`] if the line cannot be read.
    fn power_stage_ready(&mut self) -> Result<bool, PowerError>;

    /// Drive the motor-enable output (`true` = energised).  Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`PowerError::HardwareFault`] if the output cannot be written.
    fn set_motor_enable(&mut self, enabled: bool) -> Result<(), PowerError>;
}
