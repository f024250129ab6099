use geojson::Feature;

use crate::geo::display_center;

/// Operations the map view needs from the underlying mapping library.
/// The real implementation wraps a GL map instance; tests use a
/// recording fake.
pub trait MapBackend {
    fn add_parcel_layers(&mut self, feature: &Feature);
    fn set_parcel_data(&mut self, feature: &Feature);
    fn remove_parcel_layers(&mut self);
    fn add_marker(&mut self, center: [f64; 2]);
    fn remove_marker(&mut self);
    fn fly_to(&mut self, center: [f64; 2]);
    fn set_interactive(&mut self, interactive: bool);
    fn destroy(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    Loading,
    Ready,
    Unmounted,
}

/// Props threaded down from the page's fetch result.
#[derive(Debug, Default, Clone)]
pub struct MapProps {
    pub center: Option<[f64; 2]>,
    pub feature: Option<Feature>,
    pub show_marker: bool,
    pub locked: bool,
}

/// Owns one map instance for its lifetime and is the sole mutator of its
/// sources and layers.
///
/// Uninitialized → Loading on init, Loading → Ready when the backend
/// fires its load event, Unmounted is terminal.
pub struct MapView<B: MapBackend> {
    backend: B,
    state: MapState,
    props: MapProps,
    has_parcel_source: bool,
    has_marker: bool,
}

impl<B: MapBackend> MapView<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: MapState::Uninitialized,
            props: MapProps::default(),
            has_parcel_source: false,
            has_marker: false,
        }
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// First render with a valid container: construct the instance and
    /// wait for the load event.
    pub fn init(&mut self, props: MapProps) {
        if self.state != MapState::Uninitialized {
            return;
        }
        self.props = props;
        self.backend.set_interactive(!self.props.locked);
        self.state = MapState::Loading;
    }

    /// The underlying map fired its ready event: attach whatever the
    /// current props ask for.
    pub fn handle_load(&mut self) {
        if self.state != MapState::Loading {
            return;
        }

        if let Some(feature) = self.props.feature.clone() {
            self.backend.add_parcel_layers(&feature);
            self.has_parcel_source = true;
        }
        self.sync_marker();
        self.state = MapState::Ready;
    }

    /// Prop change while Ready: mutate sources in place and animate the
    /// camera rather than rebuilding the map.
    pub fn update(&mut self, props: MapProps) {
        if self.state != MapState::Ready {
            // Pre-load prop changes replace the pending props; the lock
            // flag takes effect immediately since the instance exists.
            if self.state == MapState::Loading {
                if props.locked != self.props.locked {
                    self.backend.set_interactive(!props.locked);
                }
                self.props = props;
            }
            return;
        }

        let locked_changed = props.locked != self.props.locked;
        self.props = props;

        if locked_changed {
            self.backend.set_interactive(!self.props.locked);
        }

        match (self.has_parcel_source, self.props.feature.clone()) {
            (true, Some(feature)) => self.backend.set_parcel_data(&feature),
            (false, Some(feature)) => {
                self.backend.add_parcel_layers(&feature);
                self.has_parcel_source = true;
            }
            (true, None) => {
                self.backend.remove_parcel_layers();
                self.has_parcel_source = false;
            }
            (false, None) => {}
        }

        self.sync_marker();

        if let Some(center) = self.effective_center() {
            self.backend.fly_to(center);
        }
    }

    /// Teardown releases the instance and every handle. Terminal.
    pub fn unmount(&mut self) {
        if self.state == MapState::Unmounted {
            return;
        }
        self.backend.destroy();
        self.has_parcel_source = false;
        self.has_marker = false;
        self.state = MapState::Unmounted;
    }

    /// Marker presence is toggled by add/remove. A missing or zero
    /// coordinate pair silently skips placement.
    fn sync_marker(&mut self) {
        let target = if self.props.show_marker {
            self.effective_center()
        } else {
            None
        };

        match (self.has_marker, target) {
            (false, Some(center)) => {
                self.backend.add_marker(center);
                self.has_marker = true;
            }
            (true, None) => {
                self.backend.remove_marker();
                self.has_marker = false;
            }
            (true, Some(center)) => {
                // reposition by re-add
                self.backend.remove_marker();
                self.backend.add_marker(center);
            }
            (false, None) => {}
        }
    }

    fn effective_center(&self) -> Option<[f64; 2]> {
        let center = self
            .props
            .center
            .or_else(|| self.props.feature.as_ref().and_then(display_center))?;
        if center == [0.0, 0.0] {
            return None;
        }
        Some(center)
    }
}
