use ahash::{HashMap, HashMapExt};
use log::debug;

use crate::control::{ControlEvent, ControlHandler, ControlInput, EventPropagation, ToggleAction};
use crate::error::GandalfError;
use crate::map::Map;

/// Maps control ids to the actions they perform.
#[derive(Default)]
pub struct ControlPanel {
    bindings: HashMap<String, ToggleAction>,
    handlers: Vec<Box<dyn ControlHandler>>,
}

impl ControlPanel {
    /// Creates a panel without bindings.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            handlers: vec![],
        }
    }

    /// Binds the control to the action, replacing the previous binding.
    pub fn bind(&mut self, control: impl Into<String>, action: ToggleAction) {
        self.bindings.insert(control.into(), action);
    }

    /// Action bound to the control.
    pub fn binding(&self, control: &str) -> Option<&ToggleAction> {
        self.bindings.get(control)
    }

    /// Ids of the bound controls, sorted.
    pub fn controls(&self) -> Vec<&str> {
        let mut controls: Vec<_> = self.bindings.keys().map(String::as_str).collect();
        controls.sort_unstable();
        controls
    }

    /// Adds a handler that runs before the bound actions.
    pub fn add_handler(&mut self, handler: impl ControlHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Handles activation of a control. Returns true if anything on the map changed.
    pub fn handle(&self, event: &ControlEvent, map: &mut Map) -> Result<bool, GandalfError> {
        let action = self
            .bindings
            .get(&event.control)
            .ok_or_else(|| GandalfError::UnknownControl(event.control.clone()))?;

        for handler in &self.handlers {
            if handler.handle(event, map) == EventPropagation::Stop {
                debug!("Control {} was stopped by a handler", event.control);
                return Ok(false);
            }
        }

        debug!("Control {} set to {}", event.control, event.input);
        perform(action, event, map)
    }
}

fn perform(action: &ToggleAction, event: &ControlEvent, map: &mut Map) -> Result<bool, GandalfError> {
    let invalid = |reason: &str| GandalfError::InvalidInput {
        control: event.control.clone(),
        reason: reason.to_string(),
    };

    match (action, event.input) {
        (ToggleAction::Layer { layer }, ControlInput::Checked(true)) => map.show_layer(layer),
        (ToggleAction::Layer { layer }, ControlInput::Checked(false)) => Ok(map.hide_layer(layer)),
        (ToggleAction::Exclusive { layer, group }, ControlInput::Checked(true)) => {
            map.show_exclusive(layer, group)
        }
        (ToggleAction::ClearGroup { group }, ControlInput::Checked(true)) => map.hide_group(group),
        (
            ToggleAction::Exclusive { .. } | ToggleAction::ClearGroup { .. },
            ControlInput::Checked(false),
        ) => Ok(false),
        (ToggleAction::OverlayOpacity { overlay }, ControlInput::Value(opacity)) => {
            if !opacity.is_finite() {
                return Err(invalid("opacity must be a finite number"));
            }
            map.set_overlay_opacity(overlay, opacity)
        }
        (ToggleAction::OverlayOpacity { overlay }, ControlInput::Checked(checked)) => {
            map.set_overlay_opacity(overlay, if checked { 1.0 } else { 0.0 })
        }
        (ToggleAction::OverlayElevation { overlay }, ControlInput::Value(elevation)) => map
            .set_overlay_elevation(overlay, Some(elevation))
            .map_err(|err| match err {
                GandalfError::Elevation { reason, .. } => invalid(&reason),
                other => other,
            }),
        (ToggleAction::OverlayElevation { .. }, ControlInput::Checked(_)) => {
            Err(invalid("elevation requires a numeric value"))
        }
        (_, ControlInput::Value(_)) => Err(invalid("expected a checked state")),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::layer::ExclusivityGroup;
    use crate::map::MapView;
    use crate::overlay::{Overlay, OverlayCollection, OverlaySource, TileTemplate, WmsSource};

    fn panel() -> ControlPanel {
        let mut panel = ControlPanel::new();
        panel.bind(
            "glider-track",
            ToggleAction::Layer {
                layer: "usf-sam.track".into(),
            },
        );
        for (id, layer) in [("wg-temp", "WG_Water_Temp_Layer"), ("wg-sal", "WG_Sal_Layer")] {
            panel.bind(
                id,
                ToggleAction::Exclusive {
                    layer: layer.into(),
                    group: "wave_glider".into(),
                },
            );
        }
        panel.bind(
            "wg-none",
            ToggleAction::ClearGroup {
                group: "wave_glider".into(),
            },
        );
        panel.bind(
            "salinity-opacity",
            ToggleAction::OverlayOpacity {
                overlay: "rtofs_salinity".into(),
            },
        );
        panel.bind(
            "salinity-depth",
            ToggleAction::OverlayElevation {
                overlay: "rtofs_salinity".into(),
            },
        );
        panel.bind(
            "basemap-depth",
            ToggleAction::OverlayElevation {
                overlay: "ocean_basemap".into(),
            },
        );
        panel
    }

    fn map() -> Map {
        let overlays = OverlayCollection::from(vec![
            Overlay::new(
                "rtofs_salinity",
                OverlaySource::Wms(WmsSource::new(
                    "https://gandalf.gcoos.org:8443/ncWMS2/wms?",
                    "RTOFS/salinity",
                )),
            ),
            Overlay::new(
                "ocean_basemap",
                OverlaySource::Tiles(TileTemplate::new("{z}/{y}/{x}")),
            ),
        ]);

        let mut map = Map::new(MapView::default(), overlays);
        map.layers_mut().define_group(ExclusivityGroup::new(
            "wave_glider",
            ["WG_Water_Temp_Layer", "WG_Sal_Layer"],
        ));
        map
    }

    fn checked(control: &str, checked: bool) -> ControlEvent {
        ControlEvent::new(control, ControlInput::Checked(checked))
    }

    #[test]
    fn layer_checkbox() {
        let (panel, mut map) = (panel(), map());

        assert!(panel.handle(&checked("glider-track", true), &mut map).unwrap());
        assert!(map.layers().is_visible("usf-sam.track"));
        assert!(panel.handle(&checked("glider-track", false), &mut map).unwrap());
        assert!(!map.layers().is_visible("usf-sam.track"));
    }

    #[test]
    fn radio_buttons() {
        let (panel, mut map) = (panel(), map());

        panel.handle(&checked("wg-temp", true), &mut map).unwrap();
        panel.handle(&checked("wg-sal", true), &mut map).unwrap();
        assert!(!map.layers().is_visible("WG_Water_Temp_Layer"));
        assert!(map.layers().is_visible("WG_Sal_Layer"));

        assert!(!panel.handle(&checked("wg-temp", false), &mut map).unwrap());
        assert!(map.layers().is_visible("WG_Sal_Layer"));

        panel.handle(&checked("wg-none", true), &mut map).unwrap();
        assert_eq!(map.layers().iter_visible().count(), 0);
    }

    #[test]
    fn overlay_sliders() {
        let (panel, mut map) = (panel(), map());

        let opacity = ControlEvent::new("salinity-opacity", ControlInput::Value(0.6));
        assert!(panel.handle(&opacity, &mut map).unwrap());
        assert_eq!(map.overlays().get("rtofs_salinity").map(Overlay::opacity), Some(0.6));

        let depth = ControlEvent::new("salinity-depth", ControlInput::Value(-200.0));
        assert!(panel.handle(&depth, &mut map).unwrap());

        let basemap = ControlEvent::new("basemap-depth", ControlInput::Value(-200.0));
        assert_matches!(
            panel.handle(&basemap, &mut map),
            Err(GandalfError::InvalidInput { control, .. }) if control == "basemap-depth"
        );
    }

    #[test]
    fn invalid_events() {
        let (panel, mut map) = (panel(), map());

        assert_matches!(
            panel.handle(&checked("argo", true), &mut map),
            Err(GandalfError::UnknownControl(id)) if id == "argo"
        );
        assert_matches!(
            panel.handle(&ControlEvent::new("glider-track", ControlInput::Value(1.0)), &mut map),
            Err(GandalfError::InvalidInput { .. })
        );
        assert_matches!(
            panel.handle(&checked("salinity-depth", true), &mut map),
            Err(GandalfError::InvalidInput { .. })
        );
    }

    #[test]
    fn handler_can_stop_event() {
        let (mut panel, mut map) = (panel(), map());
        panel.add_handler(|event: &ControlEvent, _map: &mut Map| {
            if event.control == "glider-track" {
                EventPropagation::Stop
            } else {
                EventPropagation::Propagate
            }
        });

        assert!(!panel.handle(&checked("glider-track", true), &mut map).unwrap());
        assert!(!map.layers().is_visible("usf-sam.track"));
        assert!(panel.handle(&checked("wg-temp", true), &mut map).unwrap());
    }
}
