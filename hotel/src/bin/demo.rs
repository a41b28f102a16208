//! Hotel Manager Demo
//!
//! Walks through a stay end to end:
//! - Room, service and guest setup
//! - Reservation workflow (draft → confirm → done) with invoicing
//! - NPS feedback and the dashboard projection
//! - Analytics backfill, room sweep and loyalty scoring
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use hotel_core::environment::SystemClock;
use hotel_core::event_bus::{EventBus, InMemoryEventBus};
use hotel_manager::app::{NewGuest, NewReservation, NewRoom, NewService};
use hotel_manager::projections::{DashboardProjection, spawn_projection};
use hotel_manager::types::{AccountId, Money, ProductId};
use hotel_manager::{DomainSettings, HotelEnvironment, HotelEvent, HotelService, HotelState};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,hotel_manager=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🏨 ============================================");
    println!("   Hotel Manager - Live Demo");
    println!("============================================\n");

    let bus: Arc<dyn EventBus<HotelEvent>> = Arc::new(InMemoryEventBus::new(256));
    let env = HotelEnvironment::new(
        Arc::new(SystemClock),
        Arc::clone(&bus),
        DomainSettings::default(),
    );
    let hotel = HotelService::with_state(HotelState::new(), env);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dashboard = Arc::new(RwLock::new(DashboardProjection::new()));
    let projection = spawn_projection(Arc::clone(&dashboard), &bus, shutdown_rx);

    // Step 1: master data
    println!("1️⃣  Creating a room and the breakfast service...");
    let room = hotel
        .create_room(NewRoom {
            single_beds: 1,
            double_beds: 1,
            price: Money::from_dollars(120),
            description: Some("Sea view".to_string()),
            product: Some(ProductId::new()),
            income_account: Some(AccountId::new()),
        })
        .await?;
    let breakfast = hotel
        .create_service(NewService {
            name: "Breakfast".to_string(),
            price: Money::from_dollars(15),
            product: ProductId::new(),
            income_account: Some(AccountId::new()),
            color: Some(3),
        })
        .await?;
    if let Some(room) = hotel.room(room).await {
        println!("   ✓ {} sleeps {} at ${}/night\n", room.number, room.capacity, room.price);
    }

    // Step 2: guests
    println!("2️⃣  Registering guests...");
    let ada = hotel
        .register_guest(NewGuest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            age: 36,
            email: Some("ada@example.com".to_string()),
            ..NewGuest::default()
        })
        .await?;
    let byron = hotel
        .register_guest(NewGuest {
            first_name: "Byron".to_string(),
            last_name: "Lovelace".to_string(),
            age: 12,
            parent: Some(ada),
            ..NewGuest::default()
        })
        .await?;
    match hotel
        .register_guest(NewGuest {
            first_name: "Unaccompanied".to_string(),
            last_name: "Minor".to_string(),
            age: 16,
            ..NewGuest::default()
        })
        .await
    {
        Ok(_) => println!("   ✗ Minor without guardian was accepted"),
        Err(e) => println!("   ✓ Rejected: {e}"),
    }
    println!();

    // Step 3: the stay
    println!("3️⃣  Booking three nights with breakfast...");
    let today = chrono::Utc::now().date_naive();
    let reservation = hotel
        .create_reservation(NewReservation {
            guest: ada,
            room,
            check_in: today,
            check_out: today + chrono::Duration::days(3),
            services: vec![breakfast],
        })
        .await?;
    hotel.add_companion(reservation, byron).await?;
    hotel.set_service_quantity(reservation, breakfast, 6).await?;
    if let Some(r) = hotel.reservation(reservation).await {
        println!(
            "   ✓ {}: {} nights, {} adult(s), {} kid(s), total ${}\n",
            r.number, r.nights, r.num_adults, r.num_kids, r.total_price
        );
    }

    // Step 4: workflow
    println!("4️⃣  Confirming and completing the stay...");
    hotel.confirm(reservation).await?;
    let prompt = hotel.complete(reservation).await?;
    if let Some(invoice) = hotel.invoice_for(reservation).await {
        println!("   ✓ Invoice {} for ${}", invoice.number, invoice.total);
        for line in &invoice.lines {
            println!("     - {} × {} = ${}", line.quantity, line.description, line.subtotal);
        }
    }
    if let Err(e) = hotel.create_invoice(reservation).await {
        println!("   ✓ Second invoice refused: {e}");
    }
    println!("   ❓ {} asks {}: {}", prompt.number, prompt.guest_name, prompt.question);
    hotel
        .record_nps(reservation, 9, Some("Lovely breakfast".to_string()))
        .await?;
    println!();

    // Step 5: batch jobs
    println!("5️⃣  Running the batch jobs...");
    let created = hotel.rebuild_analytics().await?;
    println!("   ✓ {created} daily snapshots created");
    let again = hotel.rebuild_analytics().await?;
    println!("   ✓ Second run created {again}");
    let sweep = hotel.sweep_rooms().await?;
    println!("   ✓ Room sweep: {sweep:?}");
    let model = concat!(env!("CARGO_MANIFEST_DIR"), "/models/loyalty_model.json");
    let outcome = hotel.score_loyalty(model).await;
    println!("   ✓ Loyalty scoring: {} of {} guests scored\n", outcome.scored, outcome.guests);

    // Let the projection drain the bus
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("6️⃣  Dashboard");
    if let Ok(view) = dashboard.read() {
        let summary = view.summary(today);
        println!("   Reservations: {}", summary.reservations);
        println!("   Check-ins today: {}", summary.check_ins);
        println!("   In house: {}", summary.in_house);
        println!(
            "   NPS: {} ({} promoters, {} detractors)",
            summary.nps.score, summary.nps.promoters, summary.nps.detractors
        );
        for service in &summary.services {
            println!("   {}: {} reservation(s)", service.name, service.reservations);
        }
        if let Some(snapshot) = &summary.latest_snapshot {
            println!(
                "   Latest snapshot {}: occupancy {:.1}%, RevPAR {:.2}",
                snapshot.date, snapshot.occupancy_rate, snapshot.revpar
            );
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = projection.await;
    hotel.shutdown(Duration::from_secs(5)).await?;

    println!("\n✅ Demo complete\n");
    Ok(())
}
