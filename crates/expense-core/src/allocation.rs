//! Splits group totals between the material and service buckets and
//! decomposes groups into one persisted row per sub-entity.

use expense_domain::{
    AllocationGroup, Buckets, IdentityKey, Money, OrgRef, PersistedRecord, RemainderPolicy,
    SubEntity,
};
use tracing::debug;
use uuid::Uuid;

use crate::{error::AllocationError, unit_cost::UnitCostCalculator};

/// Largest tolerated gap between `material + service` and the group total.
pub const DEFAULT_TOLERANCE: Money = Money::CENT;

/// Where decomposed rows are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    pub parent_id: Uuid,
    pub identity_key: IdentityKey,
}

/// Stateless bucket arithmetic over [`AllocationGroup`]s.
pub struct AllocationSplitter;

impl AllocationSplitter {
    /// Clamps the requested service into `[0, total]` and derives material from it.
    ///
    /// Never fails, so raw form input can be passed straight through.
    pub fn split(total: Money, requested_service: Money) -> Buckets {
        let service = requested_service.max(Money::ZERO).min(total);
        Buckets {
            material: total - service,
            service,
        }
    }

    /// Builds a group from its sub-entities, computing the total and the split.
    pub fn build_group(
        sub_entities: Vec<SubEntity>,
        requested_service: Money,
        destination: Option<OrgRef>,
        custom_memo: Option<String>,
    ) -> AllocationGroup {
        let total_value = UnitCostCalculator::compute_entities_total(&sub_entities);
        AllocationGroup {
            total_value,
            destination,
            buckets: Self::split(total_value, requested_service),
            sub_entities,
            custom_memo,
        }
    }

    /// Checks the bucket invariants with the default one-cent tolerance.
    pub fn validate(group: &AllocationGroup) -> Result<(), AllocationError> {
        Self::validate_with_tolerance(group, DEFAULT_TOLERANCE)
    }

    pub fn validate_with_tolerance(
        group: &AllocationGroup,
        tolerance: Money,
    ) -> Result<(), AllocationError> {
        let material = group.material();
        let service = group.service();
        let total = group.total_value;
        if !(material + service).within(total, tolerance) {
            return Err(AllocationError::AllocationMismatch {
                material,
                service,
                total,
            });
        }
        if service.is_negative() || service > total {
            return Err(AllocationError::ServiceOutOfRange { service, total });
        }
        if total.is_positive() && group.destination().is_none() {
            return Err(AllocationError::MissingDestination);
        }
        Ok(())
    }

    /// Expresses the group as one row per sub-entity.
    ///
    /// Each row receives its proportional share of both buckets, rounded to the
    /// cent; residue is assigned per `policy` so the row sums equal the group's
    /// buckets exactly. A zero-valued group yields zero-valued rows.
    pub fn decompose(
        group: &AllocationGroup,
        target: &RecordTarget,
        policy: RemainderPolicy,
    ) -> Vec<PersistedRecord> {
        let weights: Vec<Money> = group
            .sub_entities
            .iter()
            .map(|entity| UnitCostCalculator::compute_group_total(&entity.items))
            .collect();
        let denominator = group.total_value;
        let materials = apportion(group.material(), &weights, denominator, policy);
        let services = apportion(group.service(), &weights, denominator, policy);

        debug!(
            key = %target.identity_key,
            rows = weights.len(),
            total = %group.total_value,
            ?policy,
            "decomposing allocation group"
        );

        group
            .sub_entities
            .iter()
            .zip(materials.into_iter().zip(services))
            .map(|(entity, (material, service))| PersistedRecord {
                id: Uuid::new_v4(),
                parent_id: target.parent_id,
                identity_key: target.identity_key.clone(),
                sub_entity_label: entity.label.clone(),
                destination: group.destination.clone(),
                items: entity
                    .items
                    .iter()
                    .filter(|item| item.quantity() > 0.0)
                    .cloned()
                    .collect(),
                material_value: material,
                service_value: service,
                total_value: material + service,
                custom_memo: group.custom_memo().map(str::to_string),
            })
            .collect()
    }
}

/// Splits `amount` across `weights / denominator`, correcting residue per `policy`.
fn apportion(
    amount: Money,
    weights: &[Money],
    denominator: Money,
    policy: RemainderPolicy,
) -> Vec<Money> {
    if weights.is_empty() {
        return Vec::new();
    }
    let den = i128::from(denominator.cents());
    let value = i128::from(amount.cents());

    let mut parts: Vec<i128> = match policy {
        RemainderPolicy::FirstEntry => weights
            .iter()
            .map(|weight| {
                if den == 0 {
                    0
                } else {
                    div_round_half_away(value * i128::from(weight.cents()), den)
                }
            })
            .collect(),
        RemainderPolicy::LargestRemainder => largest_remainder(value, weights, den),
    };

    let residual = value - parts.iter().sum::<i128>();
    if residual != 0 {
        parts[0] += residual;
    }
    parts
        .into_iter()
        .map(|cents| Money::from_cents(cents as i64))
        .collect()
}

/// Floors every share, then hands out leftover cents by descending remainder.
fn largest_remainder(value: i128, weights: &[Money], den: i128) -> Vec<i128> {
    if den == 0 {
        return vec![0; weights.len()];
    }
    let mut parts = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().enumerate() {
        let numerator = value * i128::from(weight.cents());
        parts.push(numerator.div_euclid(den));
        remainders.push((numerator.rem_euclid(den), index));
    }
    let mut leftover = value - parts.iter().sum::<i128>();
    if leftover <= 0 {
        return parts;
    }
    // Stable sort keeps iteration order among equal remainders.
    remainders.sort_by(|a, b| b.0.cmp(&a.0));
    while leftover > 0 {
        for (_, index) in &remainders {
            if leftover == 0 {
                break;
            }
            parts[*index] += 1;
            leftover -= 1;
        }
    }
    parts
}

fn div_round_half_away(numerator: i128, den: i128) -> i128 {
    let quotient = numerator / den;
    let remainder = numerator % den;
    if remainder.abs() * 2 >= den.abs() {
        if (numerator < 0) != (den < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}
