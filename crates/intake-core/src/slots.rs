//! Mock appointment availability.
//!
//! Generates pseudo-random future slots for a small fixed provider roster.
//! This is demo data, not a scheduling engine: nothing is persisted and
//! nothing prevents the same slot being offered on two different calls.

use chrono::{Days, NaiveDateTime, NaiveTime};
use intake_types::SlotOffer;
use rand::seq::SliceRandom;
use rand::Rng;

/// A provider in the clinic roster.
#[derive(Debug, Clone, Copy)]
pub struct Provider {
    pub name: &'static str,
    pub specialty: &'static str,
    pub location: &'static str,
}

/// The clinic's provider roster.
pub const PROVIDER_ROSTER: [Provider; 4] = [
    Provider {
        name: "Dr. Sarah Johnson",
        specialty: "Family Medicine",
        location: "Main Office",
    },
    Provider {
        name: "Dr. Michael Chen",
        specialty: "Internal Medicine",
        location: "Downtown Clinic",
    },
    Provider {
        name: "Dr. Emily Rodriguez",
        specialty: "Pediatrics",
        location: "Children's Center",
    },
    Provider {
        name: "Dr. James Williams",
        specialty: "Family Medicine",
        location: "Main Office",
    },
];

/// Slots offered per selected provider.
pub const SLOTS_PER_PROVIDER: usize = 2;

/// Bookable start hours (24h clock).
const BUSINESS_HOURS: [u32; 6] = [9, 10, 11, 14, 15, 16];

/// Bookable minutes past the hour.
const BUSINESS_MINUTES: [u32; 2] = [0, 30];

/// Generates mock availability for `count` providers.
///
/// Providers are drawn from [`PROVIDER_ROSTER`] without replacement (`count`
/// is clamped to the roster size); each gets [`SLOTS_PER_PROVIDER`] slots at
/// business-hours times strictly between 1 and 7 days from now. The combined
/// listing is sorted ascending by start time.
pub fn generate(count: usize) -> Vec<SlotOffer> {
    generate_with(count, chrono::Local::now().naive_local(), &mut rand::thread_rng())
}

/// Deterministic core of [`generate`]: same behavior with an injected clock
/// and RNG.
pub fn generate_with<R: Rng + ?Sized>(
    count: usize,
    now: NaiveDateTime,
    rng: &mut R,
) -> Vec<SlotOffer> {
    let providers: Vec<&Provider> = PROVIDER_ROSTER
        .choose_multiple(rng, count.min(PROVIDER_ROSTER.len()))
        .collect();

    let mut offers = Vec::with_capacity(providers.len() * SLOTS_PER_PROVIDER);
    for provider in providers {
        for _ in 0..SLOTS_PER_PROVIDER {
            offers.push(SlotOffer {
                provider_name: provider.name.to_string(),
                specialty: provider.specialty.to_string(),
                location: provider.location.to_string(),
                when: random_slot_time(now, rng),
            });
        }
    }

    offers.sort_by_key(|offer| offer.when);
    offers
}

/// Picks a business-hours start time strictly between 1 and 7 days from `now`.
///
/// A calendar day offset plus a fixed clock hour can land within a day of
/// `now` (or past the week boundary) depending on the current time, so
/// candidates outside the window are resampled. The fallback (three days out
/// at 10:00) always lies inside the window.
fn random_slot_time<R: Rng + ?Sized>(now: NaiveDateTime, rng: &mut R) -> NaiveDateTime {
    let lower = now + Days::new(1);
    let upper = now + Days::new(7);

    for _ in 0..32 {
        let day_offset = rng.gen_range(1..=7);
        let hour = BUSINESS_HOURS[rng.gen_range(0..BUSINESS_HOURS.len())];
        let minute = BUSINESS_MINUTES[rng.gen_range(0..BUSINESS_MINUTES.len())];

        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
        let candidate = (now.date() + Days::new(day_offset)).and_time(time);
        if candidate > lower && candidate < upper {
            return candidate;
        }
    }

    let fallback_time = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default();
    (now.date() + Days::new(3)).and_time(fallback_time)
}
