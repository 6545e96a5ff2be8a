use super::lists::{find_item, remove_item};
use super::DomainState;
use crate::error::StateError;
use crate::models::{
    Expense, ExpenseCategory, Holding, HoldingDraft, ItemId, Person, PortfolioSummary,
};
use crate::sync::DataKey;

impl DomainState {
    pub fn set_income(&mut self, person: Person, amount: i64) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Finance)?;
        self.finance.budget_mut(person).income = amount;
        Ok(())
    }

    pub fn add_expense(
        &mut self,
        person: Person,
        category: ExpenseCategory,
        label: impl Into<String>,
        amount: i64,
    ) -> Result<ItemId, StateError> {
        self.ensure_enabled(DataKey::Finance)?;
        let expense = Expense::new(label, amount);
        let id = expense.id;
        self.finance
            .budget_mut(person)
            .expenses_mut(category)
            .push(expense);
        Ok(id)
    }

    pub fn edit_expense(
        &mut self,
        person: Person,
        id: ItemId,
        label: impl Into<String>,
        amount: i64,
    ) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Finance)?;
        let expense = self
            .finance
            .budget_mut(person)
            .find_mut(id)
            .ok_or(StateError::ItemNotFound(id))?;
        expense.label = label.into();
        expense.amount = amount;
        Ok(())
    }

    pub fn delete_expense(&mut self, person: Person, id: ItemId) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Finance)?;
        if self.finance.budget_mut(person).remove(id) {
            Ok(())
        } else {
            Err(StateError::ItemNotFound(id))
        }
    }

    pub fn add_holding(&mut self, draft: HoldingDraft) -> Result<ItemId, StateError> {
        self.ensure_enabled(DataKey::Stocks)?;
        let holding = Holding::from_draft(draft);
        let id = holding.id;
        self.stocks.push(holding);
        Ok(id)
    }

    pub fn edit_holding(&mut self, id: ItemId, draft: HoldingDraft) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Stocks)?;
        find_item(&mut self.stocks, id)?.apply(draft);
        Ok(())
    }

    /// Records a new quote; the current price becomes the previous one.
    pub fn update_holding_price(&mut self, id: ItemId, price: f64) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Stocks)?;
        find_item(&mut self.stocks, id)?.reprice(price);
        Ok(())
    }

    pub fn delete_holding(&mut self, id: ItemId) -> Result<(), StateError> {
        self.ensure_enabled(DataKey::Stocks)?;
        remove_item(&mut self.stocks, id).map(|_| ())
    }

    pub fn portfolio(&self) -> PortfolioSummary {
        PortfolioSummary::of(&self.stocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModulesConfig;

    fn state() -> DomainState {
        DomainState::seeded(ModulesConfig::default())
    }

    #[test]
    fn test_budget_totals() {
        let mut state = state();
        state.set_income(Person::Husband, 300_000).unwrap();
        state
            .add_expense(Person::Husband, ExpenseCategory::Fixed, "Rent", 90_000)
            .unwrap();
        let savings = state
            .add_expense(Person::Husband, ExpenseCategory::Savings, "NISA", 30_000)
            .unwrap();
        state
            .edit_expense(Person::Husband, savings, "NISA", 50_000)
            .unwrap();

        let budget = state.finance().budget(Person::Husband).unwrap();
        assert_eq!(budget.category_total(ExpenseCategory::Savings), 50_000);
        assert_eq!(budget.remaining(), 160_000);
        assert_eq!(state.finance().household_remaining(), 160_000);
    }

    #[test]
    fn test_delete_expense_wrong_person() {
        let mut state = state();
        let id = state
            .add_expense(Person::Wife, ExpenseCategory::Other, "Gym", 8_000)
            .unwrap();
        assert!(state.delete_expense(Person::Husband, id).is_err());
        state.delete_expense(Person::Wife, id).unwrap();
        assert_eq!(state.finance().household_expenses(), 0);
    }

    #[test]
    fn test_update_holding_price_keeps_previous() {
        let mut state = state();
        let id = state
            .add_holding(HoldingDraft::new("vt", 100.0, 10.0))
            .unwrap();
        state.update_holding_price(id, 110.0).unwrap();

        let holding = &state.stocks()[0];
        assert_eq!(holding.ticker, "VT");
        assert_eq!(holding.prev_price, 100.0);
        assert_eq!(holding.price, 110.0);

        let summary = state.portfolio();
        assert_eq!(summary.value, 1_100.0);
        assert_eq!(summary.change, 100.0);
    }

    #[test]
    fn test_edit_and_delete_holding() {
        let mut state = state();
        let id = state
            .add_holding(HoldingDraft::new("VT", 100.0, 10.0))
            .unwrap();
        state
            .edit_holding(id, HoldingDraft::new("VTI", 200.0, 5.0))
            .unwrap();
        assert_eq!(state.stocks()[0].ticker, "VTI");

        state.delete_holding(id).unwrap();
        assert!(state.stocks().is_empty());
        assert!(matches!(
            state.update_holding_price(id, 1.0),
            Err(StateError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_finance_disabled() {
        let mut state = DomainState::seeded(ModulesConfig::core_only());
        assert!(matches!(
            state.set_income(Person::Wife, 1),
            Err(StateError::ModuleDisabled(DataKey::Finance))
        ));
        assert!(matches!(
            state.add_holding(HoldingDraft::new("VT", 1.0, 1.0)),
            Err(StateError::ModuleDisabled(DataKey::Stocks))
        ));
    }
}
