//! Inventory coordinator
//!
//! [`InventoryContext`] owns every registered drop target, the instance id
//! generator, the optional template repository and persistence store, and the
//! single drag slot. Nothing here is global: construct one context per player
//! (or per UI) and hand it to whoever drives input.

use crate::drag::{self, CancelReason, DragSession, DragState, DropOutcome, Endpoints, HoverTarget};
use crate::error::{InventoryError, Result};
use crate::events::{InventoryEvent, RemovalReason};
use crate::id::{ContainerId, IdGenerator, InstanceId};
use crate::inventory::AddReport;
use crate::item::ItemInstance;
use crate::persistence::{ContainerSnapshot, ContainerStore};
use crate::placement::{PlacementQuery, PlacementResolver, PlacementResult};
use crate::repository::TemplateRepository;
use crate::target::DropTarget;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Coordinator of containers and the drag session
pub struct InventoryContext {
    containers: BTreeMap<ContainerId, Box<dyn DropTarget>>,
    ids: IdGenerator,
    templates: Option<Arc<dyn TemplateRepository>>,
    store: Option<Box<dyn ContainerStore>>,
    drag: Option<DragSession>,
    /// Events of containers that were removed before being drained
    orphaned_events: Vec<(ContainerId, InventoryEvent)>,
}

impl Default for InventoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InventoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryContext")
            .field("containers", &self.containers.keys().collect::<Vec<_>>())
            .field("ids", &self.ids)
            .field("templates", &self.templates.is_some())
            .field("store", &self.store.is_some())
            .field("drag", &self.drag)
            .finish()
    }
}

impl InventoryContext {
    /// Create a context with no collaborators
    pub fn new() -> Self {
        Self {
            containers: BTreeMap::new(),
            ids: IdGenerator::new(),
            templates: None,
            store: None,
            drag: None,
            orphaned_events: Vec::new(),
        }
    }

    /// Set the template repository
    pub fn with_templates(mut self, templates: Arc<dyn TemplateRepository>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Set the persistence store
    pub fn with_store(mut self, store: Box<dyn ContainerStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Instance id generator
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    // ------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------

    /// Register a container or equipment slot under its own id
    pub fn register_container(&mut self, target: impl DropTarget + 'static) -> Result<ContainerId> {
        let id = target.id();
        if self.containers.contains_key(&id) {
            log::warn!("{} is already registered", id);
            return Err(InventoryError::DuplicateContainer(id));
        }
        if let Some(max) = target.container().items().map(|i| i.id).max() {
            self.ids.observe(max);
        }
        log::info!("Registered {} ({:?}, {} items)", id, target.kind(), target.container().len());
        self.containers.insert(id, Box::new(target));
        Ok(id)
    }

    /// Tear a container down. Its items are destroyed and returned; an
    /// active drag out of it is cancelled first.
    pub fn remove_container(&mut self, id: ContainerId) -> Result<Vec<ItemInstance>> {
        if self.drag.as_ref().is_some_and(|s| s.origin() == id) {
            self.cancel()?;
        }
        let mut target = self
            .containers
            .remove(&id)
            .ok_or(InventoryError::ContainerNotFound(id))?;

        let held: Vec<InstanceId> = target.container().items().map(|i| i.id).collect();
        let mut destroyed = Vec::with_capacity(held.len());
        for item in held {
            destroyed.push(target.remove_stored_item(item, RemovalReason::Destroyed)?);
        }
        self.orphaned_events
            .extend(target.drain_events().into_iter().map(|e| (id, e)));

        log::info!("Removed {} ({} items destroyed)", id, destroyed.len());
        Ok(destroyed)
    }

    /// Registered container
    pub fn container(&self, id: ContainerId) -> Option<&dyn DropTarget> {
        self.containers.get(&id).map(|c| &**c as &dyn DropTarget)
    }

    /// Registered container, mutable
    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut dyn DropTarget> {
        self.containers.get_mut(&id).map(|c| &mut **c as &mut dyn DropTarget)
    }

    /// Registered container ids in ascending order
    pub fn container_ids(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.containers.keys().copied()
    }

    fn target_mut(&mut self, id: ContainerId) -> Result<&mut Box<dyn DropTarget>> {
        self.containers
            .get_mut(&id)
            .ok_or(InventoryError::ContainerNotFound(id))
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Create `quantity` of a template and store it in a container
    pub fn spawn_item(&mut self, container: ContainerId, template_id: &str, quantity: u32) -> Result<AddReport> {
        let Some(templates) = self.templates.as_ref() else {
            log::warn!("Cannot spawn {}: no template repository", template_id);
            return Err(InventoryError::ServiceUnavailable("template repository"));
        };
        let template = templates
            .template(template_id)
            .ok_or_else(|| InventoryError::UnknownTemplate(template_id.to_string()))?;
        let item = template.instantiate(self.ids.next(), quantity);

        let target = self.target_mut(container)?;
        target.store_item(item)
    }

    /// Whether `to` would take the whole of an item held by `from`
    pub fn can_give(&self, from: ContainerId, item: InstanceId, to: ContainerId) -> bool {
        let Some(item) = self.container(from).and_then(|c| c.item(item)) else {
            return false;
        };
        self.container(to).is_some_and(|target| target.container().can_add(item))
    }

    /// Move an item into another container wherever it fits.
    ///
    /// The receiving container gets a fresh instance; on failure both
    /// containers are left as they were.
    pub fn transfer_item(&mut self, from: ContainerId, item: InstanceId, to: ContainerId) -> Result<AddReport> {
        if self
            .drag
            .as_ref()
            .is_some_and(|s| s.origin() == from && s.item().id == item)
        {
            return Err(InventoryError::ConcurrentDragViolation);
        }
        if from == to {
            let held = self
                .container(from)
                .ok_or(InventoryError::ContainerNotFound(from))?
                .item(item)
                .ok_or(InventoryError::ItemNotFound(item))?;
            return Ok(AddReport {
                merged: Vec::new(),
                placed: held.position.map(|p| (item, p)),
            });
        }

        let mut endpoints = Endpoints::borrow(&mut self.containers, from, to)?;
        let source_backup = endpoints.source().container().clone();
        let target_backup = endpoints.target().container().clone();

        let moved = endpoints.source().remove_stored_item(item, RemovalReason::GivenAway)?;
        let incoming = moved.transfer(self.ids.next());
        match endpoints.target().store_item(incoming) {
            Ok(report) => {
                log::info!("Transferred {} from {} to {}", item, from, to);
                Ok(report)
            }
            Err(err) => {
                log::warn!("Transfer of {} from {} to {} failed: {}", item, from, to, err);
                *endpoints.source().container_mut() = source_backup;
                *endpoints.target().container_mut() = target_backup;
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write a container's contents to the store
    pub fn save_container(&mut self, id: ContainerId) -> Result<()> {
        let Some(store) = self.store.as_mut() else {
            log::warn!("Cannot save {}: no persistence store", id);
            return Err(InventoryError::ServiceUnavailable("persistence store"));
        };
        let target = self
            .containers
            .get(&id)
            .ok_or(InventoryError::ContainerNotFound(id))?;

        let snapshot = ContainerSnapshot::capture(target.as_ref());
        store.save(&snapshot.key(), &snapshot)?;
        log::info!("Saved {} ({} items)", id, snapshot.items.len());
        Ok(())
    }

    /// Replace a container's contents with the stored snapshot.
    /// Returns `false` if nothing was stored for it.
    pub fn load_container(&mut self, id: ContainerId) -> Result<bool> {
        if self.drag.as_ref().is_some_and(|s| s.origin() == id) {
            return Err(InventoryError::ConcurrentDragViolation);
        }
        let Some(store) = self.store.as_ref() else {
            log::warn!("Cannot load {}: no persistence store", id);
            return Err(InventoryError::ServiceUnavailable("persistence store"));
        };
        let Some(snapshot) = store.load(&ContainerSnapshot::key_for(id))? else {
            return Ok(false);
        };

        if let Some(max) = snapshot.max_instance_id() {
            self.ids.observe(max);
        }
        let count = snapshot.items.len();
        self.target_mut(id)?.set_contents(snapshot.items)?;
        log::info!("Loaded {} ({} items)", id, count);
        Ok(true)
    }

    /// Take queued events of every container, tagged with the container id
    pub fn drain_events(&mut self) -> Vec<(ContainerId, InventoryEvent)> {
        let mut events = std::mem::take(&mut self.orphaned_events);
        for (id, target) in self.containers.iter_mut() {
            events.extend(target.drain_events().into_iter().map(|e| (*id, e)));
        }
        events
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Current drag state
    pub fn drag_state(&self) -> DragState {
        if self.drag.is_some() {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    /// Active drag session
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Start dragging an item. Fails if a drag is already active, leaving it
    /// untouched.
    pub fn pick_up(&mut self, container: ContainerId, item: InstanceId) -> Result<&DragSession> {
        if let Some(active) = &self.drag {
            log::warn!(
                "Pick-up of {} refused, {} is already being dragged",
                item,
                active.item().id
            );
            return Err(InventoryError::ConcurrentDragViolation);
        }

        let working = self.target_mut(container)?.pick_up(item)?;
        log::info!("Picked up {} {} from {}", working.template_id, item, container);
        Ok(&*self.drag.insert(DragSession::begin(container, working)))
    }

    /// Update the hovered cell and recompute the verdict. Without a session
    /// this does nothing and returns `None`.
    pub fn move_to(&mut self, hover: Option<HoverTarget>) -> Option<PlacementResult> {
        let session = self.drag.as_mut()?;

        let result = match hover.and_then(|h| self.containers.get(&h.container).map(|t| (t, h.cell))) {
            Some((target, cell)) => {
                let mut query = PlacementQuery::new(session.item()).over(&**target, cell);
                if let Some(origin) = self.containers.get(&session.origin()) {
                    query = query.from_origin(&**origin);
                }
                PlacementResolver::resolve(&query)
            }
            None => PlacementResult::nowhere(),
        };

        let previous = session.hover().map(|h| h.container);
        if previous.is_some() && previous != result.target {
            if let Some(left) = previous.and_then(|id| self.containers.get_mut(&id)) {
                left.finalize_drag();
            }
        }
        if let Some(target) = result.target.and_then(|id| self.containers.get_mut(&id)) {
            target.container_mut().set_preview(result.clone());
        }

        if session.last_result().map(|r| r.verdict) != Some(result.verdict) {
            log::debug!("Drag of {} over {:?}: {:?}", session.item().id, hover, result.verdict);
        }
        session.update(hover, result.clone());
        Some(result)
    }

    /// Rotate the dragged item by 90 degrees. The cached verdict is dropped,
    /// call [`move_to`](Self::move_to) again before dropping.
    pub fn rotate(&mut self) -> Result<()> {
        let session = self.drag.as_mut().ok_or(InventoryError::NoActiveDrag)?;
        let origin = session.origin();
        if !self.containers.get(&origin).is_some_and(|c| c.allows_rotation()) {
            return Err(InventoryError::RotationLocked(origin));
        }

        session.rotate();
        if let Some(hovered) = session.hover().and_then(|h| self.containers.get_mut(&h.container)) {
            hovered.finalize_drag();
        }
        log::debug!("Rotated {} to {:?}", session.item().id, session.item().footprint.angle());
        Ok(())
    }

    /// Commit the last verdict. Rejected or missing verdicts cancel. A
    /// failed commit leaves every container as it was before the drop and
    /// ends the session.
    pub fn drop(&mut self) -> Result<DropOutcome> {
        let session = self.drag.take().ok_or(InventoryError::NoActiveDrag)?;

        let Some(result) = session.last_result().cloned() else {
            return Ok(self.finish(&session, DropOutcome::Cancelled(CancelReason::NoVerdict)));
        };
        if let Some(rejection) = result.verdict.rejection() {
            log::debug!("Drop of {} rejected: {}", session.item().id, rejection);
            return Ok(self.finish(&session, DropOutcome::Cancelled(CancelReason::Rejected(rejection))));
        }
        let Some(target) = result.target else {
            return Ok(self.finish(&session, DropOutcome::Cancelled(CancelReason::NoVerdict)));
        };

        let committed = Endpoints::borrow(&mut self.containers, session.origin(), target)
            .and_then(|endpoints| drag::commit(endpoints, &self.ids, &session, &result));
        match committed {
            Ok(outcome) => {
                log::info!("Drop of {} committed: {:?}", session.item().id, outcome);
                Ok(self.finish(&session, outcome))
            }
            Err(err) => {
                log::warn!("Drop of {} failed and was rolled back: {}", session.item().id, err);
                self.finish(&session, DropOutcome::Cancelled(CancelReason::NoVerdict));
                Err(err)
            }
        }
    }

    /// Abandon the drag, leaving the item where it was picked up
    pub fn cancel(&mut self) -> Result<DropOutcome> {
        let session = self.drag.take().ok_or(InventoryError::NoActiveDrag)?;
        log::debug!("Drag of {} cancelled", session.item().id);
        Ok(self.finish(&session, DropOutcome::Cancelled(CancelReason::Requested)))
    }

    /// Clear preview state and re-attach the source item
    fn finish(&mut self, session: &DragSession, outcome: DropOutcome) -> DropOutcome {
        if let Some(source) = self.containers.get_mut(&session.origin()) {
            source.cancel_pick_up(session.item().id);
            source.finalize_drag();
        }
        let touched = [
            session.hover().map(|h| h.container),
            session.last_result().and_then(|r| r.target),
        ];
        for id in touched.into_iter().flatten() {
            if let Some(target) = self.containers.get_mut(&id) {
                target.finalize_drag();
            }
        }
        outcome
    }
}
