//! Concurrent claim tests over a shared database file.
//!
//! Each vet gets its own connection, like two devices hitting the same store.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use pet_house_core::audit::AuditTrail;
use pet_house_core::config::Config;
use pet_house_core::db::Database;
use pet_house_core::lifecycle::Actor;
use pet_house_core::models::{
    Appointment, AppointmentStatus, EntityKind, Pet, Role, ServiceType, UserProfile,
};
use pet_house_core::notify::NotifyHub;
use pet_house_core::scheduling::{AppointmentService, ClaimOutcome};

fn config_in(dir: &TempDir) -> Config {
    Config {
        database_path: dir.path().join("race.db"),
        ..Config::default()
    }
}

/// Seed an owner, a pet, `vets` vets and one pending appointment.
fn seed(config: &Config, vets: usize) -> String {
    let db = Database::open_with_config(config, Arc::new(NotifyHub::new())).unwrap();
    db.insert_profile(&UserProfile::new(
        "owner-1".into(),
        "owner@pethouse.test".into(),
        "Olive Owner".into(),
        Role::PetOwner,
    ))
    .unwrap();
    for i in 0..vets {
        db.insert_profile(&UserProfile::new(
            format!("vet-{i}"),
            format!("vet{i}@pethouse.test"),
            format!("Dr. {i}"),
            Role::Vet,
        ))
        .unwrap();
    }
    let pet = Pet::new("owner-1".into(), "Rex".into(), "dog".into());
    db.insert_pet(&pet).unwrap();

    let appt = Appointment::new(
        pet.id,
        "owner-1".into(),
        Utc::now() + Duration::days(1),
        Duration::minutes(30),
        ServiceType::Checkup,
    );
    db.insert_appointment(&appt).unwrap();
    appt.id
}

fn race(vets: usize) -> (Config, String, Vec<(String, ClaimOutcome)>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let appt_id = seed(&config, vets);

    let barrier = Arc::new(Barrier::new(vets));
    let handles: Vec<_> = (0..vets)
        .map(|i| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            let appt_id = appt_id.clone();
            thread::spawn(move || {
                let db = Database::open_with_config(&config, Arc::new(NotifyHub::new())).unwrap();
                let vet = Actor::new(format!("vet-{i}"), Role::Vet);
                barrier.wait();
                let outcome = AppointmentService::new(&db, &config)
                    .claim(&vet, &appt_id, Utc::now())
                    .unwrap();
                (vet.id, outcome)
            })
        })
        .collect();

    let outcomes = handles.into_iter().map(|h| h.join().unwrap()).collect();
    (config, appt_id, outcomes, dir)
}

#[test]
fn test_two_vets_exactly_one_wins() {
    let (config, appt_id, outcomes, _dir) = race(2);

    let winners: Vec<&String> = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, ClaimOutcome::Claimed(_)))
        .map(|(id, _)| id)
        .collect();
    let losers = outcomes
        .iter()
        .filter(|(_, o)| *o == ClaimOutcome::AlreadyClaimed)
        .count();
    assert_eq!(winners.len(), 1);
    assert_eq!(losers, 1);

    let db = Database::open_with_config(&config, Arc::new(NotifyHub::new())).unwrap();
    let stored = db.get_appointment(&appt_id).unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
    assert_eq!(stored.vet_id.as_ref(), Some(winners[0]));
}

#[test]
fn test_many_vets_single_audit_event() {
    let (config, appt_id, outcomes, _dir) = race(6);

    let winners = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, ClaimOutcome::Claimed(_)))
        .count();
    assert_eq!(winners, 1);

    let db = Database::open_with_config(&config, Arc::new(NotifyHub::new())).unwrap();
    let trail = AuditTrail::new(&db);
    let history = trail.history(EntityKind::Appointment, &appt_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change.to_status, "confirmed");
    assert_eq!(trail.verify().unwrap(), 1);

    // Only the winner's claim notified the owner.
    assert_eq!(db.unread_notification_count("owner-1").unwrap(), 1);
}

#[test]
fn test_winner_view_names_winner() {
    let (_config, _appt_id, outcomes, _dir) = race(2);

    for (vet_id, outcome) in outcomes {
        if let ClaimOutcome::Claimed(view) = outcome {
            assert_eq!(view.appointment.vet_id.as_deref(), Some(vet_id.as_str()));
            assert_eq!(view.pet_name.as_deref(), Some("Rex"));
        }
    }
}
