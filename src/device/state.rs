use std::fmt;

pub const UNKNOWN: &str = "unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// The overwritable fields of [`DeviceState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceField {
    ConnectionStatus,
    Level,
    PumpState,
    AlarmState,
    LastTimestamp,
}

/// Last known state of the device, one raw payload per field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceState {
    pub connection_status: String,
    pub level: String,
    pub pump_state: String,
    pub alarm_state: String,
    pub last_timestamp: String,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            connection_status: UNKNOWN.to_string(),
            level: NOT_AVAILABLE.to_string(),
            pump_state: NOT_AVAILABLE.to_string(),
            alarm_state: NOT_AVAILABLE.to_string(),
            last_timestamp: NOT_AVAILABLE.to_string(),
        }
    }
}

impl DeviceState {
    /// Overwrites one field with the payload as received. No validation.
    pub fn update(&mut self, field: DeviceField, value: impl Into<String>) {
        let slot = match field {
            DeviceField::ConnectionStatus => &mut self.connection_status,
            DeviceField::Level => &mut self.level,
            DeviceField::PumpState => &mut self.pump_state,
            DeviceField::AlarmState => &mut self.alarm_state,
            DeviceField::LastTimestamp => &mut self.last_timestamp,
        };
        *slot = value.into();
    }

    pub fn snapshot(&self) -> DeviceState {
        self.clone()
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "===== DEVICE STATE =====")?;
        writeln!(f, "Connection: {}", self.connection_status)?;
        writeln!(f, "Level:      {}", self.level)?;
        writeln!(f, "Pump:       {}", self.pump_state)?;
        writeln!(f, "Alarm:      {}", self.alarm_state)?;
        writeln!(f, "Date/time:  {}", self.last_timestamp)?;
        write!(f, "========================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_sentinels() {
        let state = DeviceState::default();
        assert_eq!(state.connection_status, "unknown");
        assert_eq!(state.level, "N/A");
        assert_eq!(state.pump_state, "N/A");
        assert_eq!(state.alarm_state, "N/A");
        assert_eq!(state.last_timestamp, "N/A");
    }

    #[test]
    fn update_overwrites_only_its_field() {
        let mut state = DeviceState::default();
        state.update(DeviceField::PumpState, "ON");
        state.update(DeviceField::PumpState, "OFF");

        let snapshot = state.snapshot();
        assert_eq!(snapshot.pump_state, "OFF");
        assert_eq!(
            snapshot,
            DeviceState {
                pump_state: "OFF".to_string(),
                ..DeviceState::default()
            }
        );
    }

    #[test]
    fn block_has_five_value_lines() {
        let mut state = DeviceState::default();
        state.update(DeviceField::Level, "42");
        let block = state.to_string();
        let lines: Vec<&str> = block.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "Connection: unknown");
        assert_eq!(lines[2], "Level:      42");
        assert_eq!(lines[5], "Date/time:  N/A");
    }
}
