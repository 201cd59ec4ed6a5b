//! Fixed household roster and house policy constants.
//!
//! # Responsibility
//! - Define the housemate list consumed by rotation and expense logic.
//! - Hold the duty deadline and poll cadence shared across components.
//! - Expose the static house rules for the display layer.
//!
//! # Invariants
//! - The roster order is stable; rotation offsets index into it.
//! - Billing parties are a projection of the roster: members may share a
//!   billing id, so the billing group can be smaller than the roster.

use std::time::Duration;

/// Authorization level of a housemate.
///
/// Undo of a recorded duty action is restricted to [`Role::Admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

/// One member of the household.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Housemate {
    pub name: &'static str,
    pub role: Role,
    /// Billing party this member settles expenses under. Two members can
    /// share a billing id (they split one share between themselves).
    pub billing_id: u32,
}

/// Roster in rotation order. Index into this array is the rotation offset.
pub const HOUSEMATES: [Housemate; 4] = [
    Housemate {
        name: "Amine",
        role: Role::Admin,
        billing_id: 100,
    },
    Housemate {
        name: "Sohaib",
        role: Role::Member,
        billing_id: 200,
    },
    Housemate {
        name: "Youssef",
        role: Role::Member,
        billing_id: 300,
    },
    Housemate {
        name: "Zakaria",
        role: Role::Member,
        billing_id: 100,
    },
];

/// Distinct billing parties, in display order.
pub const BILLING_PARTIES: [(u32, &str); 3] =
    [(100, "Amine/Zakaria"), (200, "Sohaib"), (300, "Youssef")];

/// Fixed divisor for per-member expense shares.
pub const BILLING_GROUP_SIZE: u32 = 3;

/// Local hour after which a still-pending duty counts as missed.
/// House rules: a duty not completed by 10 PM of its day is a violation.
pub const DUTY_DEADLINE_HOUR: u32 = 22;

/// Cadence of the background auto-miss check.
pub const AUTO_MISS_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Day names indexed by `day_of_week` (0 = Sunday).
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Looks up a housemate by name.
pub fn housemate(name: &str) -> Option<&'static Housemate> {
    HOUSEMATES.iter().find(|member| member.name == name)
}

/// Display label for a billing party id, if known.
pub fn billing_label(billing_id: u32) -> Option<&'static str> {
    BILLING_PARTIES
        .iter()
        .find(|(id, _)| *id == billing_id)
        .map(|(_, label)| *label)
}

/// One clause of the static house rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseRule {
    pub clause: u8,
    pub title: &'static str,
    pub notes: &'static str,
}

/// Agreed house rules, rendered verbatim by the rules screen.
pub const HOUSE_RULES: [HouseRule; 3] = [
    HouseRule {
        clause: 1,
        title: "Any member who fails to perform his assigned trash duty three (3) times \
                within a single calendar month shall be assigned exclusive responsibility \
                for taking out the trash for the entire following week.",
        notes: "Each missed duty counts as one violation. A duty is considered missed if \
                not completed by 10:00 PM of the assigned day.",
    },
    HouseRule {
        clause: 2,
        title: "Each member's assigned floor cleaning duty period runs from Saturday \
                12:00 AM until Monday 11:59 PM. Any member who fails to complete his floor \
                cleaning duty within this period shall clean the entire house alone on the \
                next scheduled cleaning period.",
        notes: "Entire house includes all shared spaces (hallway, kitchen, bathroom \
                floors). A failure means the task was not done or not done properly as \
                verified by inspection.",
    },
    HouseRule {
        clause: 3,
        title: "Any member who leaves his dirty dishes in the sink for more than \
                twenty-four (24) hours after use shall clean the entire kitchen \
                preparation area, including sink, countertops, and utensils area.",
        notes: "24 hours are counted from the last recorded time of use.",
    },
];
