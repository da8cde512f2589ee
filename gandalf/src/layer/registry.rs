use log::debug;

use crate::error::GandalfError;
use crate::layer::{ExclusivityGroup, GroupScope, Layer, LayerStatus};
use crate::marker::Marker;

/// Registry of named layers with their exclusivity groups.
///
/// Layer names are unique. Asking about a layer that is not in the registry is the same as asking
/// about an empty detached layer: it is not visible, and hiding it does nothing. Layers keep the
/// order in which they were created.
///
/// All mutating visibility operations return `true` if the set of attached layers changed, so that
/// the caller can request a redraw only when needed.
///
/// ```
/// use gandalf::layer::{ExclusivityGroup, LayerRegistry};
///
/// let mut registry = LayerRegistry::default();
/// registry.define_group(ExclusivityGroup::new("sensors", ["temperature", "salinity"]));
///
/// registry.show("salinity");
/// registry.show_exclusive("temperature", "sensors").unwrap();
///
/// assert!(registry.is_visible("temperature"));
/// assert!(!registry.is_visible("salinity"));
/// ```
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    groups: Vec<ExclusivityGroup>,
}

impl LayerRegistry {
    /// Returns the layer with the given name, creating an empty detached one if it does not exist.
    pub fn ensure(&mut self, name: &str) -> &mut Layer {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                debug!("Creating layer {name}");
                self.layers.push(Layer::new(name));
                self.layers.len() - 1
            }
        };

        &mut self.layers[index]
    }

    /// Appends the marker to the named layer. Attachment of the layer does not change.
    pub fn add(&mut self, name: &str, marker: Marker) {
        self.ensure(name).push(marker);
    }

    /// Returns the layer with the given name.
    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    /// Returns true if a layer with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns true if the layer exists and is attached to the map.
    pub fn is_visible(&self, name: &str) -> bool {
        self.get(name).is_some_and(Layer::is_attached)
    }

    /// Attaches the layer to the map, creating it if needed.
    ///
    /// If the layer is a member of exclusivity groups, the other members of those groups are
    /// detached first. Layers outside the groups are not touched, whatever the group scope.
    pub fn show(&mut self, name: &str) -> bool {
        let mut changed = false;
        for group in self.groups.iter().filter(|group| group.contains(name)) {
            changed |= detach_members(&mut self.layers, name, group);
        }

        changed |= self.ensure(name).set_attached(true);
        if changed {
            debug!("Layer {name} is shown");
        }

        changed
    }

    /// Detaches the layer from the map. Hiding a detached or unknown layer does nothing.
    pub fn hide(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            return false;
        };

        let changed = self.layers[index].set_attached(false);
        if changed {
            debug!("Layer {name} is hidden");
        }

        changed
    }

    /// Detaches every layer the group excludes and then attaches `name`.
    ///
    /// For a group with [`GroupScope::Members`] scope these are the other members of the group,
    /// for [`GroupScope::Registry`] scope all other layers of the registry.
    pub fn show_exclusive(&mut self, name: &str, group: &str) -> Result<bool, GandalfError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.name() == group)
            .ok_or_else(|| GandalfError::UnknownGroup(group.to_string()))?;

        let mut changed = detach_excluded(&mut self.layers, name, group);
        changed |= self.show(name);

        Ok(changed)
    }

    /// Detaches all members of the group.
    pub fn hide_group(&mut self, group: &str) -> Result<bool, GandalfError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.name() == group)
            .ok_or_else(|| GandalfError::UnknownGroup(group.to_string()))?;

        let mut changed = false;
        for layer in self
            .layers
            .iter_mut()
            .filter(|layer| group.contains(layer.name()))
        {
            changed |= layer.set_attached(false);
        }

        Ok(changed)
    }

    /// Adds an exclusivity group, replacing a group with the same name.
    ///
    /// If more than one member of the group is attached, all but the first attached member are
    /// detached. Layers outside the group are not touched.
    pub fn define_group(&mut self, group: ExclusivityGroup) -> bool {
        let mut changed = false;
        if let Some(first) = group
            .members()
            .iter()
            .find(|member| self.is_visible(member))
            .cloned()
        {
            changed = detach_members(&mut self.layers, &first, &group);
        }

        match self.groups.iter_mut().find(|g| g.name() == group.name()) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }

        changed
    }

    /// Returns the exclusivity group with the given name.
    pub fn group(&self, name: &str) -> Option<&ExclusivityGroup> {
        self.groups.iter().find(|group| group.name() == name)
    }

    /// Returns the attached member of the group, if any.
    pub fn visible_member(&self, group: &str) -> Option<&str> {
        let group = self.group(group)?;
        group
            .members()
            .iter()
            .find(|member| self.is_visible(member))
            .map(String::as_str)
    }

    /// Legend of the attached member of the group, if the member has one.
    pub fn active_legend(&self, group: &str) -> Option<&str> {
        let member = self.visible_member(group)?;
        self.group(group)?.legend(member)
    }

    /// Iterates over all exclusivity groups.
    pub fn groups(&self) -> impl Iterator<Item = &ExclusivityGroup> + '_ {
        self.groups.iter()
    }

    /// Iterates over all layers in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter()
    }

    /// Iterates over all attached layers in creation order.
    pub fn iter_visible(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(|layer| layer.is_attached())
    }

    /// Returns the count of layers in the registry.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the registry contains no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Removes a layer from the registry and returns it.
    pub fn remove(&mut self, name: &str) -> Option<Layer> {
        self.position(name).map(|index| self.layers.remove(index))
    }

    /// Removes all layers. Exclusivity groups are kept.
    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Removes all markers of the layers populated by the `source` feed and resets them to
    /// [`LayerStatus::Pending`]. Attachment of the layers does not change.
    pub fn clear_source(&mut self, source: &str) {
        for layer in self.source_layers_mut(source) {
            layer.clear();
            layer.set_status(LayerStatus::Pending);
        }
    }

    /// Sets the status of all layers populated by the `source` feed.
    pub fn set_source_status(&mut self, source: &str, status: LayerStatus) {
        for layer in self.source_layers_mut(source) {
            layer.set_status(status.clone());
        }
    }

    /// Clears the layers populated by the `source` feed and marks them as unavailable.
    pub fn mark_unavailable(&mut self, source: &str, reason: &str) {
        for layer in self.source_layers_mut(source) {
            layer.clear();
            layer.set_status(LayerStatus::Unavailable(reason.to_string()));
        }
    }

    /// Returns the layer, creating it if needed, and records `source` as the feed populating it.
    pub(crate) fn ensure_for(&mut self, name: &str, source: &str) -> &mut Layer {
        let layer = self.ensure(name);
        layer.set_source(source);
        layer
    }

    fn source_layers_mut<'a>(&'a mut self, source: &'a str) -> impl Iterator<Item = &'a mut Layer> {
        self.layers
            .iter_mut()
            .filter(move |layer| layer.source() == Some(source))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }
}

fn detach_members(layers: &mut [Layer], name: &str, group: &ExclusivityGroup) -> bool {
    detach_where(layers, name, |layer| group.contains(layer.name()))
}

fn detach_excluded(layers: &mut [Layer], name: &str, group: &ExclusivityGroup) -> bool {
    match group.scope() {
        GroupScope::Members => detach_members(layers, name, group),
        GroupScope::Registry => detach_where(layers, name, |_| true),
    }
}

fn detach_where(layers: &mut [Layer], name: &str, excluded: impl Fn(&Layer) -> bool) -> bool {
    let mut changed = false;
    for layer in layers.iter_mut().filter(|layer| layer.name() != name) {
        if excluded(layer) {
            changed |= layer.set_attached(false);
        }
    }

    changed
}
