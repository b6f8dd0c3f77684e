//! Event, ticket type and ticket lot management.
//!
//! Callers are expected to have checked ownership already; this layer stamps
//! IDs and timestamps, validates new records and applies the lock budget.

use boxoffice_core::{
    Clock, Event, EventId, InventoryError, InventoryStore, NewEvent, NewTicket, NewTicketType,
    Page, PageRequest, Ticket, TicketId, TicketType, TicketTypeChanges, TicketTypeId,
    TicketTypeStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Catalog operations for organizers.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
}

impl CatalogService {
    /// Create a catalog service.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>, lock_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            lock_timeout,
        }
    }

    /// Create an event.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Validation`] for a blank name or empty window.
    pub async fn create_event(&self, event: NewEvent) -> Result<Event, InventoryError> {
        event.validate()?;
        let event = self
            .store
            .create_event(event.into_event(EventId::new(), self.clock.now()))
            .await?;
        info!(event_id = %event.id, capacity = event.capacity, "Event created");
        Ok(event)
    }

    /// Load an event.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`].
    pub async fn find_event(&self, id: EventId) -> Result<Event, InventoryError> {
        self.store.find_event(id).await
    }

    /// Create a ticket type in `draft`.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Validation`] or [`InventoryError::NotFound`] for a
    /// missing event.
    pub async fn create_ticket_type(
        &self,
        ticket_type: NewTicketType,
    ) -> Result<TicketType, InventoryError> {
        ticket_type.validate()?;
        let ticket_type = self
            .store
            .create_ticket_type(ticket_type.into_ticket_type(TicketTypeId::new(), self.clock.now()))
            .await?;
        info!(ticket_type_id = %ticket_type.id, event_id = %ticket_type.event_id, "Ticket type created");
        Ok(ticket_type)
    }

    /// Load a ticket type that belongs to `event_id`.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if it is missing or belongs to another event.
    pub async fn find_ticket_type(
        &self,
        event_id: EventId,
        id: TicketTypeId,
    ) -> Result<TicketType, InventoryError> {
        let ticket_type = self.store.find_ticket_type(id).await?;
        if ticket_type.event_id != event_id {
            return Err(InventoryError::not_found(boxoffice_core::Resource::TicketType, id));
        }
        Ok(ticket_type)
    }

    /// List an event's ticket types.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] for a missing event.
    pub async fn list_ticket_types(&self, event_id: EventId) -> Result<Vec<TicketType>, InventoryError> {
        self.store.list_ticket_types(event_id).await
    }

    /// Update a ticket type of `event_id`.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`], [`InventoryError::Validation`] or
    /// [`InventoryError::Timeout`].
    pub async fn update_ticket_type(
        &self,
        event_id: EventId,
        id: TicketTypeId,
        changes: TicketTypeChanges,
    ) -> Result<TicketType, InventoryError> {
        self.find_ticket_type(event_id, id).await?;
        self.store
            .update_ticket_type(id, changes, self.clock.now(), self.lock_timeout)
            .await
    }

    /// Delete a ticket type of `event_id` that no ticket references.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`], [`InventoryError::InUse`] or
    /// [`InventoryError::Timeout`].
    pub async fn delete_ticket_type(&self, event_id: EventId, id: TicketTypeId) -> Result<(), InventoryError> {
        self.find_ticket_type(event_id, id).await?;
        self.store.delete_ticket_type(id, self.lock_timeout).await?;
        info!(ticket_type_id = %id, "Ticket type deleted");
        Ok(())
    }

    /// Manually set a ticket type's status.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] or [`InventoryError::Timeout`].
    pub async fn override_status(
        &self,
        event_id: EventId,
        id: TicketTypeId,
        status: TicketTypeStatus,
    ) -> Result<TicketType, InventoryError> {
        self.find_ticket_type(event_id, id).await?;
        let ticket_type = self
            .store
            .override_ticket_type_status(id, status, self.clock.now(), self.lock_timeout)
            .await?;
        info!(ticket_type_id = %id, status = %status, "Ticket type status overridden");
        Ok(ticket_type)
    }

    /// Issue a ticket lot.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Validation`] if the lot is empty or exceeds event
    /// capacity or type allotment, [`InventoryError::NotFound`].
    pub async fn issue_ticket(&self, ticket: NewTicket) -> Result<Ticket, InventoryError> {
        ticket.validate()?;
        let ticket = self
            .store
            .issue_ticket(TicketId::new(), ticket, self.clock.now(), self.lock_timeout)
            .await?;
        info!(ticket_id = %ticket.id, quantity = ticket.quantity, "Ticket lot issued");
        Ok(ticket)
    }

    /// Page through an event's lots that still have stock.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] for a missing event.
    pub async fn available_tickets(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> Result<Page<Ticket>, InventoryError> {
        self.store.list_available_tickets(event_id, page).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use boxoffice_core::{Money, SalesWindow, UserId};
    use boxoffice_testing::{FixedClock, InMemoryInventoryStore, fixtures};
    use chrono::Duration as ChronoDuration;

    fn catalog(store: &InMemoryInventoryStore) -> CatalogService {
        CatalogService::new(
            Arc::new(store.clone()),
            Arc::new(FixedClock::new(fixtures::now())),
            Duration::from_millis(200),
        )
    }

    fn new_event(capacity: u32) -> NewEvent {
        let now = fixtures::now();
        NewEvent {
            organizer_id: UserId::new(),
            name: "Autumn Festival".to_string(),
            capacity,
            start_at: now + ChronoDuration::days(10),
            end_at: now + ChronoDuration::days(11),
        }
    }

    fn new_type(event_id: EventId, quantity: u32) -> NewTicketType {
        let now = fixtures::now();
        NewTicketType {
            event_id,
            name: "General".to_string(),
            price_cents: Money::from_minor_units(5_000),
            quantity,
            sales_window: SalesWindow::new(now, now + ChronoDuration::days(5)).unwrap(),
        }
    }

    fn lot(event_id: EventId, ticket_type_id: Option<TicketTypeId>, quantity: u32) -> NewTicket {
        NewTicket {
            event_id,
            ticket_type_id,
            title: "Block A".to_string(),
            price: Money::from_minor_units(5_000),
            quantity,
        }
    }

    #[tokio::test]
    async fn new_ticket_types_start_in_draft() {
        let store = InMemoryInventoryStore::new();
        let catalog = catalog(&store);
        let event = catalog.create_event(new_event(100)).await.unwrap();

        let ticket_type = catalog.create_ticket_type(new_type(event.id, 50)).await.unwrap();

        assert_eq!(ticket_type.status, TicketTypeStatus::Draft);
        assert_eq!(catalog.list_ticket_types(event.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn issuing_respects_event_capacity_and_type_allotment() {
        let store = InMemoryInventoryStore::new();
        let catalog = catalog(&store);
        let event = catalog.create_event(new_event(30)).await.unwrap();
        let ticket_type = catalog.create_ticket_type(new_type(event.id, 20)).await.unwrap();

        catalog.issue_ticket(lot(event.id, Some(ticket_type.id), 15)).await.unwrap();
        let over_type = catalog.issue_ticket(lot(event.id, Some(ticket_type.id), 6)).await;
        assert!(matches!(over_type, Err(InventoryError::Validation(_))));

        catalog.issue_ticket(lot(event.id, None, 15)).await.unwrap();
        let over_capacity = catalog.issue_ticket(lot(event.id, None, 1)).await;
        assert!(matches!(over_capacity, Err(InventoryError::Validation(_))));
    }

    #[tokio::test]
    async fn referenced_ticket_type_cannot_be_deleted() {
        let store = InMemoryInventoryStore::new();
        let catalog = catalog(&store);
        let event = catalog.create_event(new_event(100)).await.unwrap();
        let ticket_type = catalog.create_ticket_type(new_type(event.id, 20)).await.unwrap();
        catalog.issue_ticket(lot(event.id, Some(ticket_type.id), 5)).await.unwrap();

        let result = catalog.delete_ticket_type(event.id, ticket_type.id).await;

        assert!(matches!(result, Err(InventoryError::InUse { references: 1, .. })));
    }

    #[tokio::test]
    async fn unreferenced_ticket_type_is_deleted() {
        let store = InMemoryInventoryStore::new();
        let catalog = catalog(&store);
        let event = catalog.create_event(new_event(100)).await.unwrap();
        let ticket_type = catalog.create_ticket_type(new_type(event.id, 20)).await.unwrap();

        catalog.delete_ticket_type(event.id, ticket_type.id).await.unwrap();

        assert!(matches!(
            catalog.find_ticket_type(event.id, ticket_type.id).await,
            Err(InventoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ticket_type_of_another_event_is_not_found() {
        let store = InMemoryInventoryStore::new();
        let catalog = catalog(&store);
        let event = catalog.create_event(new_event(100)).await.unwrap();
        let other = catalog.create_event(new_event(100)).await.unwrap();
        let ticket_type = catalog.create_ticket_type(new_type(event.id, 20)).await.unwrap();

        let result = catalog
            .override_status(other.id, ticket_type.id, TicketTypeStatus::Closed)
            .await;

        assert!(matches!(result, Err(InventoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn available_tickets_skip_exhausted_lots() {
        let store = InMemoryInventoryStore::new();
        let catalog = catalog(&store);
        let event = catalog.create_event(new_event(100)).await.unwrap();
        catalog.issue_ticket(lot(event.id, None, 5)).await.unwrap();
        let sold = catalog.issue_ticket(lot(event.id, None, 5)).await.unwrap();
        store.set_available_quantity(sold.id, 0);

        let page = catalog
            .available_tickets(event.id, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|ticket| ticket.available_quantity > 0));
    }
}
