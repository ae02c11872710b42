use std::collections::BTreeSet;
use std::fmt;

use gloomhold_protocol::{ParticipantId, Vec3};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{AreaBackend, SpaceConfig, SpaceError};

/// Lifecycle state of the instance space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceState {
    Uninitialized,
    Ready,
    /// Terminal.
    Destroyed,
}

impl fmt::Display for SpaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Ready => write!(f, "READY"),
            Self::Destroyed => write!(f, "DESTROYED"),
        }
    }
}

/// A claimed grid cell: the slot index and the cell's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub index: usize,
    pub origin: Vec3,
}

/// The shared area all runs are built in, plus the allocation of its grid
/// cells.
pub struct InstanceSpace<B> {
    backend: B,
    config: SpaceConfig,
    state: SpaceState,
    occupied: BTreeSet<usize>,
}

impl<B: AreaBackend> InstanceSpace<B> {
    /// An uninitialized space. Nothing touches the backend until
    /// [`initialize`](Self::initialize).
    pub fn new(backend: B, config: SpaceConfig) -> Self {
        Self {
            backend,
            config: config.validated(),
            state: SpaceState::Uninitialized,
            occupied: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> SpaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SpaceState::Ready
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Creates the area with the baseline settings.
    ///
    /// A stale area left over from a previous session is deleted first so
    /// every session starts clean. On failure the space stays
    /// UNINITIALIZED and no run can be created until a later `initialize`
    /// or [`reset`](Self::reset) succeeds. A READY space is left as is.
    pub fn initialize(&mut self) -> Result<(), SpaceError> {
        match self.state {
            SpaceState::Destroyed => return Err(SpaceError::Destroyed),
            SpaceState::Ready => {
                debug!(area = %self.config.area_name, "instance space already ready");
                return Ok(());
            }
            SpaceState::Uninitialized => {}
        }

        let area = self.config.area_name.clone();
        if self.backend.area_exists(&area) {
            info!(%area, "removing stale instance area");
            self.tear_down_area();
        }

        self.backend
            .create_area(&area)
            .map_err(|source| SpaceError::Allocation {
                area: area.clone(),
                source,
            })?;

        if let Err(source) = self.backend.apply_settings(&area, &self.config.settings) {
            // Never leave a half-configured area behind.
            if let Err(e) = self.backend.destroy_area(&area) {
                warn!(%area, error = %e, "failed to drop misconfigured area");
            }
            return Err(SpaceError::Allocation { area, source });
        }

        self.occupied.clear();
        self.state = SpaceState::Ready;
        info!(%area, capacity = self.config.capacity(), "instance space ready");
        Ok(())
    }

    /// Evacuates everyone, destroys the area and creates a fresh one.
    ///
    /// Every slot is released. From UNINITIALIZED this is just
    /// [`initialize`](Self::initialize).
    pub fn reset(&mut self) -> Result<(), SpaceError> {
        match self.state {
            SpaceState::Destroyed => return Err(SpaceError::Destroyed),
            SpaceState::Uninitialized => return self.initialize(),
            SpaceState::Ready => {}
        }
        info!(area = %self.config.area_name, "resetting instance space");
        self.tear_down_area();
        self.occupied.clear();
        self.state = SpaceState::Uninitialized;
        self.initialize()
    }

    /// Evacuates everyone and destroys the area for good.
    pub fn shutdown(&mut self) {
        match self.state {
            SpaceState::Destroyed => return,
            SpaceState::Ready => self.tear_down_area(),
            SpaceState::Uninitialized => {}
        }
        self.occupied.clear();
        self.state = SpaceState::Destroyed;
        info!(area = %self.config.area_name, "instance space destroyed");
    }

    /// Moves one participant out of the area.
    pub fn evacuate(&mut self, participant: ParticipantId) -> Result<(), SpaceError> {
        self.backend
            .evacuate(participant)
            .map_err(|source| SpaceError::Evacuation {
                participant,
                source,
            })
    }

    /// Evacuates every occupant, then destroys the area. Failures are
    /// logged; the area is destroyed regardless.
    fn tear_down_area(&mut self) {
        let area = self.config.area_name.clone();
        let occupants = self.backend.occupants(&area);
        for participant in occupants {
            if let Err(e) = self.evacuate(participant) {
                warn!(%area, error = %e, "evacuation failed");
            }
        }
        if let Err(e) = self.backend.destroy_area(&area) {
            warn!(%area, error = %e, "failed to destroy instance area");
        }
    }

    /// Origin of grid cell `index`.
    ///
    /// Cells fill row by row; indices past `grid_width²` wrap around onto
    /// the start of the grid.
    pub fn next_instance_location(&self, index: usize) -> Vec3 {
        let width = self.config.grid_width.max(1) as usize;
        let col = index % width;
        let row = (index / width) % width;
        Vec3::new(
            col as f64 * self.config.cell_spacing,
            self.config.base_height,
            row as f64 * self.config.cell_spacing,
        )
    }

    /// Claims the lowest free cell.
    pub fn claim_slot(&mut self) -> Result<Slot, SpaceError> {
        match self.state {
            SpaceState::Ready => {}
            SpaceState::Destroyed => return Err(SpaceError::Destroyed),
            state => return Err(SpaceError::NotReady(state)),
        }
        let capacity = self.config.capacity();
        let index = (0..capacity)
            .find(|i| !self.occupied.contains(i))
            .ok_or(SpaceError::Full { capacity })?;
        self.occupied.insert(index);
        let origin = self.next_instance_location(index);
        debug!(index, x = origin.x, z = origin.z, "slot claimed");
        Ok(Slot { index, origin })
    }

    /// Frees a cell. Returns `false` if it was not claimed.
    pub fn release_slot(&mut self, index: usize) -> bool {
        let released = self.occupied.remove(&index);
        if released {
            debug!(index, "slot released");
        }
        released
    }

    pub fn slots_in_use(&self) -> usize {
        self.occupied.len()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }
}

impl<B> fmt::Debug for InstanceSpace<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSpace")
            .field("area", &self.config.area_name)
            .field("state", &self.state)
            .field("slots_in_use", &self.occupied.len())
            .finish()
    }
}
