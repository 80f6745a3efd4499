//! Cart entity

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Service, ServiceId};

/// One service staged for booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub service: Service,
    /// Always at least 1
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.service.price * Decimal::from(self.quantity)
    }
}

/// Amounts shown before the customer proceeds to book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillSummary {
    pub item_total: Decimal,
    pub service_charges: Decimal,
    pub to_pay: Decimal,
}

/// Per-session cart; lines are unique by service id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `service`, merging with an existing line
    pub fn add(&mut self, service: Service) {
        match self.lines.iter_mut().find(|l| l.service.id == service.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                service,
                quantity: 1,
            }),
        }
    }

    pub fn remove(&mut self, service_id: &ServiceId) {
        self.lines.retain(|l| &l.service.id != service_id);
    }

    /// Set an exact quantity; zero or less drops the line
    pub fn set_quantity(&mut self, service_id: &ServiceId, quantity: i64) {
        if quantity <= 0 {
            self.remove(service_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| &l.service.id == service_id) {
            line.quantity = quantity;
        }
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Item total plus the flat service charge; an empty cart owes nothing
    pub fn bill(&self, service_charge: Decimal) -> BillSummary {
        let item_total = self.total();
        let service_charges = if self.is_empty() {
            Decimal::ZERO
        } else {
            service_charge
        };
        BillSummary {
            item_total,
            service_charges,
            to_pay: item_total + service_charges,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop exactly the lines for the given services
    pub fn remove_services<'a>(&mut self, service_ids: impl IntoIterator<Item = &'a ServiceId>) {
        for id in service_ids {
            self.remove(id);
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn quantity_of(&self, service_id: &ServiceId) -> Option<u32> {
        self.lines
            .iter()
            .find(|l| &l.service.id == service_id)
            .map(|l| l.quantity)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
