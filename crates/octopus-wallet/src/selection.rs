//! Note selection: picks which owned notes fund a spend. Unshield can spend
//! several notes in sequence, so selection there sorts by value descending
//! and consumes notes until their cumulative value covers the target,
//! minimizing the number of sequential proofs the caller has to build.
//! Transfer/swap spends take at most two, so selection there prefers a
//! single covering note before falling back to the pair with the smallest
//! combined value that still covers the target amount — minimizing
//! leftover change and, with it, the number of notes the next spend has to
//! juggle.

use crate::scanner::OwnedNote;
use octopus_crypto::Field;
use octopus_types::{OctopusError, OctopusResult};

/// Selects the notes funding an unshield spend: notes of `token` are sorted
/// by value descending and consumed until their cumulative value is `>=
/// amount`. The caller drives one sequential unshield proof per consumed
/// note — full value for every note but the last, the remainder (with
/// change) for the last. Fails with [`OctopusError::InsufficientBalance`]
/// only when the full available balance is below `amount`.
pub fn select_for_unshield<'a>(
    notes: &'a [OwnedNote],
    token: Field,
    amount: u64,
) -> OctopusResult<Vec<&'a OwnedNote>> {
    let mut candidates: Vec<&OwnedNote> = notes
        .iter()
        .filter(|n| !n.spent && n.note.token == token)
        .collect();
    candidates.sort_by_key(|n| std::cmp::Reverse(n.note.value));

    let mut chosen = Vec::new();
    let mut cumulative = 0u64;
    for note in candidates {
        if cumulative >= amount {
            break;
        }
        cumulative += note.note.value;
        chosen.push(note);
    }

    if cumulative < amount {
        return Err(OctopusError::InsufficientBalance {
            needed: amount,
            available: cumulative,
        });
    }
    Ok(chosen)
}

/// Selects one or two notes covering `amount` in `token`: a single note if
/// one suffices, otherwise the pair with the smallest total value that is
/// still `>= amount`. Returns [`OctopusError::NoCoveringPair`] if no note or
/// pair covers the amount even though the aggregate balance might.
pub fn select_for_transfer<'a>(
    notes: &'a [OwnedNote],
    token: Field,
    amount: u64,
) -> OctopusResult<Vec<&'a OwnedNote>> {
    let candidates: Vec<&OwnedNote> = notes
        .iter()
        .filter(|n| !n.spent && n.note.token == token)
        .collect();

    if let Some(single) = candidates
        .iter()
        .copied()
        .filter(|n| n.note.value >= amount)
        .min_by_key(|n| n.note.value)
    {
        return Ok(vec![single]);
    }

    let mut best: Option<(u64, (&OwnedNote, &OwnedNote))> = None;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let total = candidates[i].note.value + candidates[j].note.value;
            if total < amount {
                continue;
            }
            if best.map_or(true, |(best_total, _)| total < best_total) {
                best = Some((total, (candidates[i], candidates[j])));
            }
        }
    }

    match best {
        Some((_, (a, b))) => Ok(vec![a, b]),
        None => {
            let total_available: u64 = candidates.iter().map(|n| n.note.value).sum();
            if total_available >= amount {
                Err(OctopusError::NoCoveringPair)
            } else {
                Err(OctopusError::InsufficientBalance {
                    needed: amount,
                    available: total_available,
                })
            }
        }
    }
}
