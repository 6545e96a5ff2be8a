//! Household budget: monthly income and categorized expenses per person.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{fill_missing_ids, Identified, ItemId, Person};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Savings,
    Fixed,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 3] = [
        ExpenseCategory::Savings,
        ExpenseCategory::Fixed,
        ExpenseCategory::Other,
    ];
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseCategory::Savings => write!(f, "savings"),
            ExpenseCategory::Fixed => write!(f, "fixed"),
            ExpenseCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "savings" => Ok(ExpenseCategory::Savings),
            "fixed" => Ok(ExpenseCategory::Fixed),
            "other" => Ok(ExpenseCategory::Other),
            _ => Err(format!(
                "Invalid expense category '{}'. Valid options: savings, fixed, other",
                s
            )),
        }
    }
}

/// A single budget line. Amounts are whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub amount: i64,
}

impl Expense {
    pub fn new(label: impl Into<String>, amount: i64) -> Self {
        Self {
            id: ItemId::new(),
            label: label.into(),
            amount,
        }
    }
}

impl Identified for Expense {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// One person's monthly budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub income: i64,
    #[serde(default)]
    pub savings: Vec<Expense>,
    #[serde(default)]
    pub fixed: Vec<Expense>,
    #[serde(default)]
    pub other: Vec<Expense>,
}

impl Budget {
    pub fn expenses(&self, category: ExpenseCategory) -> &[Expense] {
        match category {
            ExpenseCategory::Savings => &self.savings,
            ExpenseCategory::Fixed => &self.fixed,
            ExpenseCategory::Other => &self.other,
        }
    }

    pub fn expenses_mut(&mut self, category: ExpenseCategory) -> &mut Vec<Expense> {
        match category {
            ExpenseCategory::Savings => &mut self.savings,
            ExpenseCategory::Fixed => &mut self.fixed,
            ExpenseCategory::Other => &mut self.other,
        }
    }

    pub fn category_total(&self, category: ExpenseCategory) -> i64 {
        saturating_sum(self.expenses(category).iter().map(|e| e.amount))
    }

    pub fn total_expenses(&self) -> i64 {
        saturating_sum(ExpenseCategory::ALL.iter().map(|c| self.category_total(*c)))
    }

    /// Income left after all expenses; negative when overspent.
    pub fn remaining(&self) -> i64 {
        self.income.saturating_sub(self.total_expenses())
    }

    /// Finds an expense by id in any category.
    pub fn find_mut(&mut self, id: ItemId) -> Option<&mut Expense> {
        self.savings
            .iter_mut()
            .chain(self.fixed.iter_mut())
            .chain(self.other.iter_mut())
            .find(|e| e.id == id)
    }

    /// Removes an expense by id from whichever category holds it.
    pub fn remove(&mut self, id: ItemId) -> bool {
        for category in ExpenseCategory::ALL {
            let list = self.expenses_mut(category);
            if let Some(pos) = list.iter().position(|e| e.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }
}

/// Budgets keyed by person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Finance(pub BTreeMap<Person, Budget>);

impl Default for Finance {
    fn default() -> Self {
        let mut budgets = BTreeMap::new();
        budgets.insert(Person::Husband, Budget::default());
        budgets.insert(Person::Wife, Budget::default());
        Self(budgets)
    }
}

impl Finance {
    pub fn budget(&self, person: Person) -> Option<&Budget> {
        self.0.get(&person)
    }

    pub fn budget_mut(&mut self, person: Person) -> &mut Budget {
        self.0.entry(person).or_default()
    }

    pub fn household_income(&self) -> i64 {
        saturating_sum(self.0.values().map(|b| b.income))
    }

    pub fn household_expenses(&self) -> i64 {
        saturating_sum(self.0.values().map(|b| b.total_expenses()))
    }

    pub fn household_remaining(&self) -> i64 {
        self.household_income()
            .saturating_sub(self.household_expenses())
    }

    pub fn fill_missing_ids(&mut self, key: &str) {
        for (person, budget) in self.0.iter_mut() {
            for category in ExpenseCategory::ALL {
                let scope = format!("{}/{}", person, category);
                fill_missing_ids(budget.expenses_mut(category), key, &scope);
            }
        }
    }
}

// Amounts arrive from the remote unchecked.
fn saturating_sum(amounts: impl Iterator<Item = i64>) -> i64 {
    amounts.fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn budget() -> Budget {
        Budget {
            income: 300_000,
            savings: vec![Expense::new("NISA", 30_000)],
            fixed: vec![Expense::new("Rent", 90_000), Expense::new("Phone", 5_000)],
            other: vec![Expense::new("Hobby", 10_000)],
        }
    }

    #[test]
    fn test_budget_totals() {
        let b = budget();
        assert_eq!(b.category_total(ExpenseCategory::Fixed), 95_000);
        assert_eq!(b.total_expenses(), 135_000);
        assert_eq!(b.remaining(), 165_000);
    }

    #[test]
    fn test_remove_searches_all_categories() {
        let mut b = budget();
        let id = b.other[0].id;
        assert!(b.remove(id));
        assert!(b.other.is_empty());
        assert!(!b.remove(id));
    }

    #[test]
    fn test_finance_serializes_as_person_map() {
        let finance = Finance::default();
        let value = serde_json::to_value(&finance).unwrap();
        assert!(value.get("husband").is_some());
        assert!(value.get("wife").is_some());
        assert_eq!(value["wife"]["income"], 0);
    }

    #[test]
    fn test_household_totals() {
        let mut finance = Finance::default();
        *finance.budget_mut(Person::Husband) = budget();
        finance.budget_mut(Person::Wife).income = 200_000;
        assert_eq!(finance.household_income(), 500_000);
        assert_eq!(finance.household_expenses(), 135_000);
        assert_eq!(finance.household_remaining(), 365_000);
    }

    #[test]
    fn test_totals_saturate_on_extreme_amounts() {
        let finance: Finance = serde_json::from_value(json!({
            "husband": {"income": -5, "fixed": [{"amount": i64::MAX}, {"amount": 1}]},
            "wife": {"income": i64::MAX, "other": [{"amount": i64::MIN}]}
        }))
        .unwrap();

        let husband = finance.budget(Person::Husband).unwrap();
        assert_eq!(husband.category_total(ExpenseCategory::Fixed), i64::MAX);
        assert_eq!(husband.remaining(), i64::MIN);
        assert_eq!(finance.household_income(), i64::MAX - 5);
        assert_eq!(finance.household_expenses(), -1);
        assert_eq!(finance.household_remaining(), i64::MAX - 4);
    }

    #[test]
    fn test_legacy_expenses_get_ids() {
        let mut finance: Finance = serde_json::from_value(json!({
            "husband": {"income": 100, "fixed": [{"label": "Rent", "amount": 50}]}
        }))
        .unwrap();
        finance.fill_missing_ids("finance");
        let rent = &finance.budget(Person::Husband).unwrap().fixed[0];
        assert!(!rent.id.is_nil());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            ExpenseCategory::from_str("Fixed").unwrap(),
            ExpenseCategory::Fixed
        );
        assert!(ExpenseCategory::from_str("food").is_err());
    }
}
