//! Contract tests for the in-memory repository

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use chrono::{Duration, Utc};
use eventdesk_core::error::ErrorKind;
use eventdesk_core::filter::EventFilter;
use eventdesk_core::repository::{AdmissionRequest, Repository};
use eventdesk_core::types::{
    Capacity, CategoryId, Currency, Event, EventCategory, EventId, Price, RegistrationId,
    TicketId, TicketPricing, UserId,
};
use eventdesk_testing::InMemoryRepository;
use std::sync::Arc;

async fn category(repository: &InMemoryRepository, name: &str) -> CategoryId {
    let category = EventCategory {
        id: CategoryId::new(),
        name: name.to_string(),
        description: String::new(),
    };
    repository.insert_category(category.clone()).await.unwrap();
    category.id
}

fn event(category_id: CategoryId, title: &str, days: i64, capacity: u32) -> Event {
    let now = Utc::now();
    Event {
        id: EventId::new(),
        title: title.to_string(),
        description: String::new(),
        date: now + Duration::days(days),
        location: "Lagos".to_string(),
        category_id,
        created_by: UserId::new(),
        capacity: Capacity::new(capacity),
        created_at: now,
    }
}

fn ticket(event_id: EventId, ticket_type: &str) -> TicketPricing {
    TicketPricing {
        id: TicketId::new(),
        event_id,
        ticket_type: ticket_type.to_string(),
        price: "25.00".parse::<Price>().unwrap(),
        currency: Currency::default(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_never_overbook() {
    let repository = Arc::new(InMemoryRepository::new());
    let category_id = category(&repository, "Conference").await;
    let launch = event(category_id, "Launch", 5, 3);
    repository.insert_event(launch.clone()).await.unwrap();

    let attempts = (0..50).map(|_| {
        let repository = Arc::clone(&repository);
        let event_id = launch.id;
        tokio::spawn(async move {
            repository
                .admit(AdmissionRequest {
                    registration_id: RegistrationId::new(),
                    user_id: UserId::new(),
                    event_id,
                    now: Utc::now(),
                })
                .await
        })
    });
    let outcomes = futures::future::join_all(attempts).await;

    let admitted = outcomes.iter().filter(|o| matches!(o, Ok(Ok(_)))).count();
    let rejected_full = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(Err(e)) if e.kind() == ErrorKind::Capacity))
        .count();
    assert_eq!(admitted, 3);
    assert_eq!(rejected_full, 47);
    assert_eq!(repository.seats_taken(launch.id).await.unwrap(), 3);
}

#[tokio::test]
async fn pricing_keeps_insertion_order_and_unique_types() {
    let repository = InMemoryRepository::new();
    let category_id = category(&repository, "Conference").await;
    let launch = event(category_id, "Launch", 5, 0);
    repository.insert_event(launch.clone()).await.unwrap();

    for label in ["VIP", "Regular", "Student"] {
        repository
            .insert_pricing(ticket(launch.id, label))
            .await
            .unwrap();
    }
    let err = repository
        .insert_pricing(ticket(launch.id, "VIP"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let labels: Vec<_> = repository
        .pricing_for_event(launch.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.ticket_type)
        .collect();
    assert_eq!(labels, ["VIP", "Regular", "Student"]);
}

#[tokio::test]
async fn same_ticket_type_allowed_on_different_events() {
    let repository = InMemoryRepository::new();
    let category_id = category(&repository, "Conference").await;
    let first = event(category_id, "Launch", 5, 0);
    let second = event(category_id, "Meetup", 6, 0);
    repository.insert_event(first.clone()).await.unwrap();
    repository.insert_event(second.clone()).await.unwrap();

    repository
        .insert_pricing(ticket(first.id, "VIP"))
        .await
        .unwrap();
    repository
        .insert_pricing(ticket(second.id, "VIP"))
        .await
        .unwrap();
    assert_eq!(repository.pricing_count().await, 2);
}

#[tokio::test]
async fn upcoming_events_filters_by_category() {
    let repository = InMemoryRepository::new();
    let conference = category(&repository, "Conference").await;
    let workshop = category(&repository, "Workshop").await;
    repository
        .insert_event(event(conference, "Launch", 5, 0))
        .await
        .unwrap();
    repository
        .insert_event(event(workshop, "Hands-on", 2, 0))
        .await
        .unwrap();

    let upcoming = repository
        .upcoming_events(EventFilter::default().category(conference), Utc::now())
        .await
        .unwrap();
    let titles: Vec<_> = upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Launch"]);

    let all = repository
        .upcoming_events(EventFilter::default(), Utc::now())
        .await
        .unwrap();
    let titles: Vec<_> = all.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Hands-on", "Launch"]);
}

#[test]
fn duplicate_category_names_conflict() {
    tokio_test::block_on(async {
        let repository = InMemoryRepository::new();
        category(&repository, "Conference").await;
        let err = repository
            .insert_category(EventCategory {
                id: CategoryId::new(),
                name: "Conference".to_string(),
                description: "again".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    });
}

#[tokio::test]
async fn event_with_unknown_category_is_invalid() {
    let repository = InMemoryRepository::new();
    let err = repository
        .insert_event(event(CategoryId::new(), "Orphan", 3, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
