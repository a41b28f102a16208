//! Derived-field dependency graph.
//!
//! Every derived field of the entity store is a node with edges from the
//! fields it is computed from. When inputs change, [`DependencyGraph::affected`]
//! returns the derived fields to recompute, in topological order, so a field
//! is always recomputed after everything it reads.
//!
//! ```text
//! single_beds ─┐
//! double_beds ─┴─> capacity
//!
//! line_quantity ──┐
//! line_price_unit ┴─> line_total ──> services_total ─┐
//! check_in ──┐                                       │
//! check_out ─┴─> nights ─────────────────────────────┼─> total_price ─┐
//! room_price ────────────────────────────────────────┘                │
//! guest_lines ──> num_adults, num_kids                                │
//! status, guest_age ──────────────────────────────────────────────────┴─> guest_crm
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// A field of the entity store that takes part in recomputation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Room single bed count
    SingleBeds,
    /// Room double bed count
    DoubleBeds,
    /// Room capacity (derived)
    Capacity,
    /// Room nightly price
    RoomPrice,
    /// Service line quantity
    LineQuantity,
    /// Service line unit price
    LinePriceUnit,
    /// Service line total (derived)
    LineTotal,
    /// Reservation check-in
    CheckIn,
    /// Reservation check-out
    CheckOut,
    /// Reservation nights (derived)
    Nights,
    /// Reservation services total (derived)
    ServicesTotal,
    /// Reservation total price (derived)
    TotalPrice,
    /// Reservation guest lines
    GuestLines,
    /// Adults on the reservation (derived)
    NumAdults,
    /// Kids on the reservation (derived)
    NumKids,
    /// Reservation workflow state
    Status,
    /// Guest age
    GuestAge,
    /// Guest CRM metrics (derived, cross-entity)
    GuestCrm,
}

/// Directed graph from input fields to the derived fields that read them
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependents: BTreeMap<Field, BTreeSet<Field>>,
}

impl DependencyGraph {
    /// Empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `derived` is computed from every field in `inputs`
    #[must_use]
    pub fn derive(mut self, derived: Field, inputs: &[Field]) -> Self {
        for input in inputs {
            self.dependents.entry(*input).or_default().insert(derived);
        }
        self
    }

    /// The graph of the hotel entity store
    #[must_use]
    pub fn hotel() -> Self {
        Self::new()
            .derive(Field::Capacity, &[Field::SingleBeds, Field::DoubleBeds])
            .derive(Field::LineTotal, &[Field::LineQuantity, Field::LinePriceUnit])
            .derive(Field::Nights, &[Field::CheckIn, Field::CheckOut])
            .derive(Field::ServicesTotal, &[Field::LineTotal])
            .derive(
                Field::TotalPrice,
                &[Field::RoomPrice, Field::Nights, Field::ServicesTotal],
            )
            .derive(Field::NumAdults, &[Field::GuestLines])
            .derive(Field::NumKids, &[Field::GuestLines])
            .derive(
                Field::GuestCrm,
                &[Field::TotalPrice, Field::CheckIn, Field::Status, Field::GuestAge],
            )
    }

    /// Derived fields reachable from `changed`, in dependency order.
    ///
    /// Kahn's algorithm over the reachable subgraph; ties are broken by
    /// [`Field`] order so the result is deterministic. Fields that are part
    /// of a cycle are left out.
    #[must_use]
    pub fn affected(&self, changed: &[Field]) -> Vec<Field> {
        let mut reachable = BTreeSet::new();
        let mut stack: Vec<Field> = changed.to_vec();
        while let Some(field) = stack.pop() {
            for dependent in self.dependents.get(&field).into_iter().flatten() {
                if reachable.insert(*dependent) {
                    stack.push(*dependent);
                }
            }
        }

        // In-degree counts only edges inside the reachable set
        let mut in_degree: BTreeMap<Field, usize> =
            reachable.iter().map(|field| (*field, 0)).collect();
        for (input, dependents) in &self.dependents {
            if !reachable.contains(input) {
                continue;
            }
            for dependent in dependents {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree += 1;
                }
            }
        }

        let mut ready: BTreeSet<Field> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(field, _)| *field)
            .collect();
        let mut order = Vec::with_capacity(reachable.len());

        while let Some(field) = ready.pop_first() {
            order.push(field);
            for dependent in self.dependents.get(&field).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }
        order
    }
}

/// Shared instance of [`DependencyGraph::hotel`]
pub static HOTEL_GRAPH: LazyLock<DependencyGraph> = LazyLock::new(DependencyGraph::hotel);

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[Field], field: Field) -> usize {
        order.iter().position(|f| *f == field).unwrap_or(usize::MAX)
    }

    #[test]
    fn bed_change_only_touches_capacity() {
        assert_eq!(HOTEL_GRAPH.affected(&[Field::DoubleBeds]), vec![Field::Capacity]);
    }

    #[test]
    fn line_quantity_propagates_to_total_and_crm() {
        let order = HOTEL_GRAPH.affected(&[Field::LineQuantity]);
        assert_eq!(
            order,
            vec![Field::LineTotal, Field::ServicesTotal, Field::TotalPrice, Field::GuestCrm]
        );
    }

    #[test]
    fn date_change_recomputes_nights_before_total() {
        let order = HOTEL_GRAPH.affected(&[Field::CheckIn]);
        assert!(position(&order, Field::Nights) < position(&order, Field::TotalPrice));
        assert!(position(&order, Field::TotalPrice) < position(&order, Field::GuestCrm));
        assert!(!order.contains(&Field::Capacity));
    }

    #[test]
    fn unrelated_inputs_affect_nothing() {
        assert!(HOTEL_GRAPH.affected(&[Field::Capacity]).is_empty());
    }

    #[test]
    fn cycles_are_dropped() {
        let graph = DependencyGraph::new()
            .derive(Field::Nights, &[Field::TotalPrice])
            .derive(Field::TotalPrice, &[Field::Nights]);
        assert!(graph.affected(&[Field::Nights]).is_empty());
    }
}
