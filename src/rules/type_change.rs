//! Allow-list of column type changes that skip the table rewrite.
//!
//! Only the shape of the change is checked here; whether the target engine
//! version actually has the fast path is decided by the thresholds table.

use crate::model::TypeName;

fn is_varchar(name: &str) -> bool {
    matches!(name, "varchar" | "character varying")
}

fn is_numeric(name: &str) -> bool {
    matches!(name, "numeric" | "decimal")
}

fn is_varbit(name: &str) -> bool {
    matches!(name, "varbit" | "bit varying")
}

fn is_timestamp(name: &str) -> bool {
    matches!(name, "timestamp" | "timestamp without time zone")
}

fn is_timestamptz(name: &str) -> bool {
    matches!(name, "timestamptz" | "timestamp with time zone")
}

/// Single length modifier (`varchar(N)`, `varbit(N)`): widening or removing
/// the limit is safe, adding a limit or shrinking is not.
fn is_length_widening(old: &TypeName, new: &TypeName) -> bool {
    match (old.modifiers.first(), new.modifiers.first()) {
        (Some(&old_len), Some(&new_len)) => new_len >= old_len,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => true,
    }
}

/// `numeric(P)` is `numeric(P, 0)`.
fn precision_and_scale(modifiers: &[i64]) -> Option<(i64, i64)> {
    match modifiers {
        [p, s] => Some((*p, *s)),
        [p] => Some((*p, 0)),
        _ => None,
    }
}

/// Precision increase with equal scale, or dropping the constraint entirely.
fn is_numeric_widening(old: &TypeName, new: &TypeName) -> bool {
    match (old.modifiers.as_slice(), new.modifiers.as_slice()) {
        (_, []) => true,
        ([], _) => false,
        (old_mods, new_mods) => {
            match (precision_and_scale(old_mods), precision_and_scale(new_mods)) {
                (Some((old_p, old_s)), Some((new_p, new_s))) => new_p >= old_p && new_s == old_s,
                _ => false,
            }
        }
    }
}

/// Binary-coercible changes PostgreSQL applies without rewriting the table.
///
/// - `varchar(N)` -> `varchar(M)` where M >= N, or -> unbounded `varchar`
/// - `varchar(N)` -> `text`
/// - `text` -> unbounded `varchar`
/// - `numeric(P,S)` -> `numeric(P2,S)` where P2 >= P, or -> unconstrained `numeric`
/// - `varbit(N)` -> `varbit(M)` where M >= N
/// - `cidr` -> `inet`
/// - `citext` <-> `text`
pub fn is_binary_coercible(old: &TypeName, new: &TypeName) -> bool {
    if old.array != new.array {
        return false;
    }
    let (old_name, new_name) = (old.name.as_str(), new.name.as_str());

    if is_varchar(old_name) {
        if is_varchar(new_name) {
            return is_length_widening(old, new);
        }
        if new_name == "text" {
            return true;
        }
    }
    if old_name == "text" && is_varchar(new_name) {
        return new.modifiers.is_empty();
    }
    if is_numeric(old_name) && is_numeric(new_name) {
        return is_numeric_widening(old, new);
    }
    if is_varbit(old_name) && is_varbit(new_name) {
        return is_length_widening(old, new);
    }

    matches!(
        (old_name, new_name),
        ("cidr", "inet") | ("citext", "text") | ("text", "citext")
    )
}

/// `timestamp` <-> `timestamptz` with identical precision. Metadata-only on
/// PostgreSQL 12+ when the session time zone is UTC.
pub fn is_time_zone_swap(old: &TypeName, new: &TypeName) -> bool {
    let (old_name, new_name) = (old.name.as_str(), new.name.as_str());
    let swapped = (is_timestamp(old_name) && is_timestamptz(new_name))
        || (is_timestamptz(old_name) && is_timestamp(new_name));
    swapped && old.modifiers == new.modifiers && old.array == new.array
}

/// MySQL stores VARCHAR lengths up to 255 in one byte and longer ones in two.
const ONE_BYTE_LENGTH_MAX: i64 = 255;

/// VARCHAR extension that stays in the same length-byte bucket, which
/// MySQL/MariaDB apply in place.
pub fn is_varchar_in_bucket_extension(old: &TypeName, new: &TypeName) -> bool {
    if old.array || new.array || !is_varchar(&old.name) || !is_varchar(&new.name) {
        return false;
    }
    match (old.modifiers.as_slice(), new.modifiers.as_slice()) {
        ([old_len], [new_len]) => {
            new_len >= old_len
                && (*old_len <= ONE_BYTE_LENGTH_MAX) == (*new_len <= ONE_BYTE_LENGTH_MAX)
        }
        _ => false,
    }
}
