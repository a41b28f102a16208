//! Shared setup for the integration tests.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use chrono::NaiveDate;
use hotel_core::event_bus::{EventBus, InMemoryEventBus};
use hotel_manager::app::{NewGuest, NewRoom, NewService};
use hotel_manager::types::{AccountId, GuestId, Money, ProductId, RoomId, ServiceId};
use hotel_manager::{DomainSettings, HotelEnvironment, HotelEvent, HotelService, HotelState};
use hotel_testing::ManualClock;
use std::sync::Arc;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub fn day(offset: i64) -> NaiveDate {
    today() + chrono::Duration::days(offset)
}

pub struct Hotel {
    pub service: HotelService,
    pub clock: ManualClock,
    pub bus: Arc<dyn EventBus<HotelEvent>>,
}

pub fn hotel() -> Hotel {
    hotel_with(DomainSettings::default())
}

pub fn hotel_with(settings: DomainSettings) -> Hotel {
    let clock = ManualClock::new(today().and_hms_opt(12, 0, 0).expect("valid time").and_utc());
    let bus: Arc<dyn EventBus<HotelEvent>> = Arc::new(InMemoryEventBus::new(1024));
    let env = HotelEnvironment::new(Arc::new(clock.clone()), Arc::clone(&bus), settings);
    Hotel {
        service: HotelService::with_state(HotelState::new(), env),
        clock,
        bus,
    }
}

impl Hotel {
    pub async fn room(&self, price_dollars: u64) -> RoomId {
        self.service
            .create_room(NewRoom {
                single_beds: 1,
                double_beds: 1,
                price: Money::from_dollars(price_dollars),
                description: None,
                product: Some(ProductId::new()),
                income_account: Some(AccountId::new()),
            })
            .await
            .expect("room should be created")
    }

    pub async fn guest(&self, first_name: &str, last_name: &str, age: u32) -> GuestId {
        self.service
            .register_guest(NewGuest {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                age,
                email: Some(format!("{}@example.com", first_name.to_lowercase())),
                ..NewGuest::default()
            })
            .await
            .expect("guest should be registered")
    }

    pub async fn catalog_service(&self, name: &str, price_dollars: u64) -> ServiceId {
        self.service
            .create_service(NewService {
                name: name.to_string(),
                price: Money::from_dollars(price_dollars),
                product: ProductId::new(),
                income_account: Some(AccountId::new()),
                color: None,
            })
            .await
            .expect("service should be created")
    }
}
