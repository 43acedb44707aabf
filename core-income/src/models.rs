use serde::{Deserialize, Serialize};

/// One line of an income registration: a service sold `quantity` times at
/// `unit_amount` each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeItem {
    pub name: String,
    pub quantity: u32,
    /// Price of a single unit, in rubles
    pub unit_amount: f64,
}

impl IncomeItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_amount: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_amount,
        }
    }

    /// `quantity × unit_amount`, before rounding
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.unit_amount
    }
}

/// Ordered set of line items submitted as a single receipt.
///
/// # Examples
///
/// ```
/// use core_income::{IncomeItem, IncomeRequest};
///
/// let request = IncomeRequest::new()
///     .with_item(IncomeItem::new("Consulting", 1, 1000.0))
///     .with_item(IncomeItem::new("Travel", 2, 150.5));
/// assert_eq!(request.items().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeRequest {
    items: Vec<IncomeItem>,
}

impl IncomeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: IncomeItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn push(&mut self, item: IncomeItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[IncomeItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<IncomeItem>> for IncomeRequest {
    fn from(items: Vec<IncomeItem>) -> Self {
        Self { items }
    }
}

impl FromIterator<IncomeItem> for IncomeRequest {
    fn from_iter<I: IntoIterator<Item = IncomeItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Server confirmation of a registered income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt identifier assigned by the service
    pub id: String,
    /// Receipt data as JSON
    pub json_url: String,
    /// Printable receipt
    pub print_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_item_order() {
        let request: IncomeRequest = vec![
            IncomeItem::new("A", 2, 100.005),
            IncomeItem::new("B", 1, 50.0),
        ]
        .into();

        let names: Vec<_> = request.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(IncomeItem::new("A", 3, 1.5).subtotal(), 4.5);
        assert_eq!(IncomeItem::new("A", 0, 99.0).subtotal(), 0.0);
    }

    #[test]
    fn test_empty_request() {
        let mut request = IncomeRequest::new();
        assert!(request.is_empty());
        request.push(IncomeItem::new("A", 1, 1.0));
        assert!(!request.is_empty());
    }
}
