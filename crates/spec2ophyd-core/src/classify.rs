//! Line classification for SPEC config files

use crate::device::DeviceKind;

/// Prefix of motor parameter continuation lines
pub const MOTPAR_PREFIX: &str = "MOTPAR:";

/// What a single (already trimmed) config line declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty line or `#` comment
    Skip,
    Device(DeviceKind),
    /// Text after `MOTPAR:`, belongs to the preceding motor
    MotorParameter(&'a str),
    Counter,
    Motor,
    Unrecognized,
}

/// Classify a trimmed line, first matching rule wins
pub fn classify(line: &str) -> LineKind<'_> {
    if line.is_empty() || line.starts_with('#') {
        return LineKind::Skip;
    }

    let key = line.split('=').next().unwrap_or_default().trim();
    if let Some(kind) = DeviceKind::from_key(key) {
        return LineKind::Device(kind);
    }
    if key.starts_with(MOTPAR_PREFIX) {
        return LineKind::MotorParameter(line[MOTPAR_PREFIX.len()..].trim());
    }
    if is_numbered(line, "CNT") {
        return LineKind::Counter;
    }
    if is_numbered(line, "MOT") {
        return LineKind::Motor;
    }
    LineKind::Unrecognized
}

/// `prefix` immediately followed by at least one digit
fn is_numbered(line: &str, prefix: &str) -> bool {
    line.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_blanks() {
        assert_eq!(classify(""), LineKind::Skip);
        assert_eq!(classify("# ID @(#)getinfo.c"), LineKind::Skip);
        assert_eq!(classify("#CNT000 = EPICS_SC 0 0 1 0x0 sec sec"), LineKind::Skip);
    }

    #[test]
    fn test_devices() {
        assert_eq!(
            classify("VM_EPICS_M1 = 9idcLAX:m58:c0: 8"),
            LineKind::Device(DeviceKind::EpicsMotor)
        );
        assert_eq!(
            classify("PSE_MAC_MOT = kappa 4"),
            LineKind::Device(DeviceKind::MacroMotor)
        );
        // key must match exactly, not by prefix
        assert_eq!(classify("VM_EPICS_M1X = foo 1"), LineKind::Unrecognized);
    }

    #[test]
    fn test_motor_parameter() {
        assert_eq!(
            classify("MOTPAR:read_mode = 7"),
            LineKind::MotorParameter("read_mode = 7")
        );
    }

    #[test]
    fn test_channels() {
        assert_eq!(
            classify("CNT000 = EPICS_SC  0  0 10000000 0x001      sec  seconds"),
            LineKind::Counter
        );
        assert_eq!(
            classify("MOT002 = EPICS_M2:0/3   2000  1  2000  200   50  125    0 0x003       my  my"),
            LineKind::Motor
        );
        // MOTPAR must not be mistaken for a motor, and bare MOT needs digits
        assert_eq!(classify("MOT = foo"), LineKind::Unrecognized);
        assert_eq!(classify("MOTOR_FOO = 1"), LineKind::Unrecognized);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify("SW_SFTWARE = 1 NONE"), LineKind::Unrecognized);
        assert_eq!(classify("VM_EPICS_M2 = 9idcLAX:m1 1"), LineKind::Unrecognized);
    }
}
