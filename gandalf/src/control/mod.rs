//! This module binds the portal controls (checkboxes, radio buttons, sliders) to operations on the
//! [`Map`].
//!
//! Control handling is done in two steps:
//! 1. The host reads the state of the control at the moment it was activated and gives it to the
//!    [`ControlPanel`] as a [`ControlEvent`].
//! 2. `ControlPanel` runs its custom [`ControlHandler`]s, and unless one of them stops the event,
//!    performs the [`ToggleAction`] bound to the control.
//!
//! There is no debouncing: every event is handled as it comes.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::map::Map;

mod panel;

pub use panel::ControlPanel;

/// Custom control handler.
pub trait ControlHandler: Send + Sync {
    /// Handle the event.
    fn handle(&self, event: &ControlEvent, map: &mut Map) -> EventPropagation;
}

impl<T: for<'a> Fn(&'a ControlEvent, &'a mut Map) -> EventPropagation> ControlHandler for T
where
    T: Send + Sync,
{
    fn handle(&self, event: &ControlEvent, map: &mut Map) -> EventPropagation {
        self(event, map)
    }
}

/// Operation performed when a control is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ToggleAction {
    /// Checkbox showing and hiding a layer.
    Layer {
        /// Layer name.
        layer: String,
    },
    /// Radio button showing one layer of an exclusivity group. Unchecking does nothing.
    Exclusive {
        /// Layer name.
        layer: String,
        /// Exclusivity group name.
        group: String,
    },
    /// Radio button hiding all layers of an exclusivity group.
    ClearGroup {
        /// Exclusivity group name.
        group: String,
    },
    /// Slider setting the opacity of an overlay. A checkbox makes it opaque or transparent.
    OverlayOpacity {
        /// Overlay name.
        overlay: String,
    },
    /// Slider setting the elevation (depth) of a WMS overlay.
    OverlayElevation {
        /// Overlay name.
        overlay: String,
    },
}

/// State of a control at the moment it was activated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlInput {
    /// Checkbox or radio button state.
    Checked(bool),
    /// Slider or number input value.
    Value(f64),
}

impl FromStr for ControlInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "checked" => Ok(Self::Checked(true)),
            "off" | "false" | "unchecked" => Ok(Self::Checked(false)),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(Self::Value)
                .ok_or_else(|| format!("expected on, off or a number, got '{s}'")),
        }
    }
}

impl Display for ControlInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checked(true) => write!(f, "on"),
            Self::Checked(false) => write!(f, "off"),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

/// Activation of a control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
    /// Id of the control.
    pub control: String,
    /// State of the control.
    pub input: ControlInput,
}

impl ControlEvent {
    /// Creates a new event.
    pub fn new(control: impl Into<String>, input: ControlInput) -> Self {
        Self {
            control: control.into(),
            input,
        }
    }
}

/// Value returned by a [`ControlHandler`] to indicate the status of the event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventPropagation {
    /// Event should be propagated to the next handler and then to the bound action.
    Propagate,
    /// Event should not be propagated further. The bound action is not performed.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input() {
        assert_eq!("on".parse::<ControlInput>(), Ok(ControlInput::Checked(true)));
        assert_eq!("OFF".parse::<ControlInput>(), Ok(ControlInput::Checked(false)));
        assert_eq!("-50".parse::<ControlInput>(), Ok(ControlInput::Value(-50.0)));
        assert_eq!("0.25".parse::<ControlInput>(), Ok(ControlInput::Value(0.25)));
        assert!("NaN".parse::<ControlInput>().is_err());
        assert!("maybe".parse::<ControlInput>().is_err());
    }

    #[test]
    fn deserialize_action() {
        let action: ToggleAction = serde_json::from_str(
            r#"{"action": "exclusive", "layer": "WG_Sal_Layer", "group": "wave_glider"}"#,
        )
        .unwrap();

        assert_eq!(
            action,
            ToggleAction::Exclusive {
                layer: "WG_Sal_Layer".into(),
                group: "wave_glider".into()
            }
        );
    }
}
