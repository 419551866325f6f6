//! Deterministic participant synthesis
//!
//! In pre-race mode a read for an unknown bib auto-provisions a
//! participant so the display always has something to show. The generator
//! is seeded from the bib, so the same unmatched bib resolves to the same
//! identity on every read for the lifetime of the process.

use std::hash::{Hash, Hasher};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::record::ParticipantRecord;

const FIRST_NAMES: [&str; 54] = [
    "John", "Mary", "David", "Sarah", "Michael", "Jennifer", "Robert", "Jessica", "William",
    "Ashley", "James", "Amanda", "Christopher", "Melissa", "Daniel", "Michelle", "Matthew",
    "Kimberly", "Anthony", "Amy", "Mark", "Angela", "Donald", "Helen", "Steven", "Deborah",
    "Paul", "Rachel", "Andrew", "Carolyn", "Kenneth", "Janet", "Lisa", "Catherine", "Kevin",
    "Frances", "Brian", "Christine", "George", "Samantha", "Edward", "Debra", "Ronald", "Nancy",
    "Timothy", "Maria", "Jason", "Sandra", "Jeffrey", "Donna", "Ryan", "Carol", "Jacob", "Ruth",
];

const LAST_NAMES: [&str; 56] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
    "Scott", "Torres", "Nguyen", "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall",
    "Rivera", "Campbell", "Mitchell", "Carter", "Roberts", "Gomez", "Phillips", "Evans",
    "Turner", "Diaz", "Parker",
];

const CITIES: [&str; 34] = [
    "Austin", "Houston", "Dallas", "San Antonio", "Fort Worth", "El Paso", "Arlington",
    "Corpus Christi", "Plano", "Lubbock", "Laredo", "Irving", "Garland", "Frisco", "McKinney",
    "Grand Prairie", "Brownsville", "Killeen", "Pasadena", "Mesquite", "McAllen", "Carrollton",
    "Midland", "Waco", "Round Rock", "Richardson", "Lewisville", "College Station", "Pearland",
    "Denton", "Tyler", "Odessa", "Abilene", "Beaumont",
];

const TEAMS: [&str; 6] = ["", "", "", "Running Club", "Fitness Team", "Marathon Group"];

/// Seed derivation: numeric bibs seed directly, anything else hashes.
fn seed_for(bib: &str) -> u64 {
    match bib.parse::<u64>() {
        Ok(n) => n,
        Err(_) => {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            bib.hash(&mut hasher);
            hasher.finish()
        }
    }
}

/// Last ASCII digit of the bib, used for the category/wave derivations
fn last_digit(bib: &str) -> u32 {
    bib.chars()
        .rev()
        .find_map(|c| c.to_digit(10))
        .unwrap_or(0)
}

/// Synthesize a participant for an unmatched bib
///
/// Deterministic for a given bib: the RNG is seeded from the bib value.
pub fn synthesize_participant(bib: &str, race_name: &str) -> ParticipantRecord {
    let mut rng = SmallRng::seed_from_u64(seed_for(bib));

    // unwrap: the name/city tables are non-empty constants
    let first_name = *FIRST_NAMES.choose(&mut rng).unwrap();
    let last_name = *LAST_NAMES.choose(&mut rng).unwrap();
    let city = *CITIES.choose(&mut rng).unwrap();
    let age: u32 = rng.gen_range(18..=75);
    let gender = if rng.gen_bool(0.5) { "M" } else { "F" };
    let team = *TEAMS.choose(&mut rng).unwrap();

    let decade = age / 10;
    let division = format!(
        "{} {}0-{}9",
        if gender == "M" { "Men" } else { "Women" },
        decade,
        decade
    );

    let digit = last_digit(bib);
    let reg_choice = if digit % 2 == 0 {
        "Marathon"
    } else {
        "Half Marathon"
    };
    let wave = format!("Wave {}", digit % 3 + 1);

    ParticipantRecord {
        name: format!("{} {}", first_name, last_name),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        age: age.to_string(),
        gender: gender.to_owned(),
        city: city.to_owned(),
        state: "TX".to_owned(),
        country: "USA".to_owned(),
        division,
        race_name: race_name.to_owned(),
        reg_choice: reg_choice.to_owned(),
        wave,
        team_name: team.to_owned(),
        entry_status: "active".to_owned(),
        entry_type: "auto-created".to_owned(),
        entry_id: bib.to_owned(),
        athlete_id: bib.to_owned(),
        results: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_same_bib() {
        let a = synthesize_participant("7777", "Test Race");
        let b = synthesize_participant("7777", "Test Race");
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_numeric_bib_is_stable() {
        let a = synthesize_participant("A-42", "Test Race");
        let b = synthesize_participant("A-42", "Test Race");
        assert_eq!(a, b);
        assert!(!a.name.is_empty());
    }

    #[test]
    fn test_marked_auto_created() {
        let p = synthesize_participant("123", "Test Race");
        assert_eq!(p.entry_type, "auto-created");
        assert_eq!(p.entry_id, "123");
        assert_eq!(p.athlete_id, "123");
        assert!(p.results.is_none());
    }

    #[test]
    fn test_age_and_division_consistent() {
        let p = synthesize_participant("9478", "Test Race");
        let age: u32 = p.age.parse().unwrap();
        assert!((18..=75).contains(&age));

        let decade = age / 10;
        let expected_prefix = if p.gender == "M" { "Men" } else { "Women" };
        assert_eq!(
            p.division,
            format!("{} {}0-{}9", expected_prefix, decade, decade)
        );
    }

    #[test]
    fn test_category_follows_last_digit_parity() {
        let even = synthesize_participant("12", "r");
        let odd = synthesize_participant("13", "r");
        assert_eq!(even.reg_choice, "Marathon");
        assert_eq!(odd.reg_choice, "Half Marathon");
    }
}
