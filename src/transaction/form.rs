//! The transaction form shared by the new and edit pages, and the "Other…"
//! category shortcut.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{
        Category, CategoryId, CategoryKind, CategoryName, MAX_CATEGORY_NAME_LENGTH,
        get_category, get_or_create_category, kind_radio_group,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        loading_spinner,
    },
    transaction::core::{
        MAX_TITLE_LENGTH, Transaction, TransactionBuilder, TransactionId, create_transaction,
        update_transaction,
    },
};

/// The form data for creating or updating a transaction.
///
/// Parsed with axum_extra's `Form`, which treats an empty `category_id` as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionFormData {
    pub kind: CategoryKind,
    pub amount: f64,
    pub date: Date,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    /// One of the user's existing categories.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The name of a category to use or create instead of picking one from the list.
    #[serde(default)]
    pub new_category: String,
}

impl TransactionFormData {
    /// Start a [TransactionBuilder] with the category that was resolved for this form.
    pub fn into_builder(self, category_id: CategoryId) -> TransactionBuilder {
        TransactionBuilder {
            category_id,
            kind: self.kind,
            amount: self.amount,
            date: self.date,
            title: self.title,
            notes: self.notes,
        }
    }
}

/// Work out which category a transaction should use.
///
/// Exactly one of `category_id` and `new_category` must be given. An existing
/// category is looked up among `owner`'s categories and must have the same
/// kind as the transaction. A new name reuses `owner`'s category of that kind
/// and name if there is one, otherwise the category is created, so retrying
/// with the same name always resolves to the same category.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCategory] if neither was given,
/// - [Error::AmbiguousCategory] if both were given,
/// - [Error::InvalidCategory] if `category_id` is not one of `owner`'s categories,
/// - [Error::CategoryKindMismatch] if the existing category has a different kind,
/// - [Error::EmptyCategoryName] or [Error::CategoryNameTooLong] for a bad new name.
pub fn resolve_category(
    owner: UserID,
    kind: CategoryKind,
    category_id: Option<CategoryId>,
    new_category: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    let new_category = new_category.trim();

    match (category_id, new_category.is_empty()) {
        (None, true) => Err(Error::MissingCategory),
        (Some(_), false) => Err(Error::AmbiguousCategory),
        (Some(category_id), true) => {
            let category = get_category(owner, category_id, connection).map_err(|error| {
                match error {
                    Error::NotFound => Error::InvalidCategory(Some(category_id)),
                    error => error,
                }
            })?;

            if category.kind != kind {
                return Err(Error::CategoryKindMismatch {
                    category: category.kind,
                    transaction: kind,
                });
            }

            Ok(category)
        }
        (None, false) => {
            let name = CategoryName::new(new_category)?;
            get_or_create_category(owner, name, kind, connection)
        }
    }
}

/// Resolve the category for `form` and save the transaction.
///
/// Creates a transaction when `existing` is `None`, otherwise replaces the
/// transaction with that ID. Both steps run in one SQL transaction so that a
/// category created through "Other…" is rolled back if the transaction is rejected.
///
/// # Errors
/// Returns the errors of [resolve_category], [TransactionBuilder::finalize],
/// [create_transaction] and [update_transaction].
pub fn save_transaction_form(
    owner: UserID,
    existing: Option<TransactionId>,
    form: TransactionFormData,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tx = connection.unchecked_transaction()?;

    let category = resolve_category(owner, form.kind, form.category_id, &form.new_category, &tx)?;
    let new_transaction = form.into_builder(category.id).finalize(today)?;

    let transaction = match existing {
        Some(id) => update_transaction(owner, id, new_transaction, &tx)?,
        None => create_transaction(owner, new_transaction, &tx)?,
    };

    tx.commit()?;

    Ok(transaction)
}

/// Whether `error` is caused by the user's input and should be shown in the form.
pub fn is_form_error(error: &Error) -> bool {
    matches!(
        error,
        Error::EmptyTitle
            | Error::TitleTooLong(_)
            | Error::InvalidAmount
            | Error::FutureDate(_)
            | Error::MissingCategory
            | Error::AmbiguousCategory
            | Error::InvalidCategory(_)
            | Error::CategoryKindMismatch { .. }
            | Error::EmptyCategoryName
            | Error::CategoryNameTooLong(_)
    )
}

/// The values to fill the transaction form with.
pub struct TransactionFormDefaults<'a> {
    pub kind: CategoryKind,
    pub amount: Option<f64>,
    pub date: Date,
    pub title: &'a str,
    pub notes: &'a str,
    pub category_id: Option<CategoryId>,
    pub new_category: &'a str,
    pub max_date: Date,
}

impl<'a> TransactionFormDefaults<'a> {
    /// An empty expense dated `today`.
    pub fn new(today: Date) -> Self {
        Self {
            kind: CategoryKind::Expense,
            amount: None,
            date: today,
            title: "",
            notes: "",
            category_id: None,
            new_category: "",
            max_date: today,
        }
    }

    /// Refill the form with what the user submitted.
    pub fn from_form(form: &'a TransactionFormData, max_date: Date) -> Self {
        Self {
            kind: form.kind,
            amount: Some(form.amount),
            date: form.date,
            title: &form.title,
            notes: &form.notes,
            category_id: form.category_id,
            new_category: &form.new_category,
            max_date,
        }
    }
}

/// Where a transaction form is sent.
pub enum FormTarget<'a> {
    /// Send a POST request to create a transaction.
    Create(&'a str),
    /// Send a PUT request to update a transaction.
    Update(&'a str),
}

/// Render a complete transaction form with an optional error message above the submit button.
pub fn transaction_form(
    target: FormTarget<'_>,
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match target {
        FormTarget::Create(endpoint) => (Some(endpoint), None, " Create Transaction"),
        FormTarget::Update(endpoint) => (None, Some(endpoint), " Update Transaction"),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (transaction_form_fields(defaults, categories))

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                (submit_text)
            }
        }
    }
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
) -> Markup {
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));

    html! {
        (kind_radio_group("kind", "Transaction type", defaults.kind))

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder="0.00"
                    min="0.01"
                    required
                    value=[amount_str.as_deref()]
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="title" class=(FORM_LABEL_STYLE) { "Title" }

            input
                name="title"
                id="title"
                type="text"
                placeholder="e.g. Weekly shop"
                value=(defaults.title)
                maxlength=(MAX_TITLE_LENGTH)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[defaults.category_id.is_none()] { "Other…" }

                @for kind in CategoryKind::ALL {
                    optgroup label=(kind)
                    {
                        @for category in categories.iter().filter(|category| category.kind == kind) {
                            option
                                value=(category.id)
                                selected[defaults.category_id == Some(category.id)]
                            {
                                (category.name) " (" (category.kind) ")"
                            }
                        }
                    }
                }
            }
        }

        div
        {
            label for="new_category" class=(FORM_LABEL_STYLE) { "New category" }

            input
                name="new_category"
                id="new_category"
                type="text"
                placeholder="Pick \"Other…\" above and type a name"
                value=(defaults.new_category)
                maxlength=(MAX_CATEGORY_NAME_LENGTH)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

            textarea
                name="notes"
                id="notes"
                rows="3"
                placeholder="Optional"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                (defaults.notes)
            }
        }
    }
}

#[cfg(test)]
mod resolve_category_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        category::{Category, CategoryKind, CategoryName, create_category, get_categories},
        test_utils::{get_test_connection, insert_test_user},
        transaction::form::{TransactionFormData, resolve_category, save_transaction_form},
    };

    fn setup() -> (Connection, UserID, Category) {
        let connection = get_test_connection();
        let owner = insert_test_user(&connection, "ada");
        let category = create_category(
            owner,
            CategoryName::new_unchecked("Groceries"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        (connection, owner, category)
    }

    #[test]
    fn fails_without_a_category() {
        let (connection, owner, _) = setup();

        let result = resolve_category(owner, CategoryKind::Expense, None, "  ", &connection);

        assert_eq!(result, Err(Error::MissingCategory));
    }

    #[test]
    fn fails_with_both_a_category_and_a_new_name() {
        let (connection, owner, category) = setup();

        let result = resolve_category(
            owner,
            CategoryKind::Expense,
            Some(category.id),
            "Snacks",
            &connection,
        );

        assert_eq!(result, Err(Error::AmbiguousCategory));
    }

    #[test]
    fn returns_existing_category() {
        let (connection, owner, category) = setup();

        let result =
            resolve_category(owner, CategoryKind::Expense, Some(category.id), "", &connection);

        assert_eq!(result, Ok(category));
    }

    #[test]
    fn rejects_another_users_category() {
        let (connection, _, category) = setup();
        let other_user = insert_test_user(&connection, "grace");

        let result = resolve_category(
            other_user,
            CategoryKind::Expense,
            Some(category.id),
            "",
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(category.id))));
    }

    #[test]
    fn rejects_category_of_other_kind() {
        let (connection, owner, category) = setup();

        let result =
            resolve_category(owner, CategoryKind::Income, Some(category.id), "", &connection);

        assert_eq!(
            result,
            Err(Error::CategoryKindMismatch {
                category: CategoryKind::Expense,
                transaction: CategoryKind::Income,
            })
        );
    }

    #[test]
    fn new_name_is_created_once() {
        let (connection, owner, _) = setup();

        let first =
            resolve_category(owner, CategoryKind::Income, None, " Side  hustle ", &connection)
                .unwrap();
        let second =
            resolve_category(owner, CategoryKind::Income, None, "side hustle", &connection)
                .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.name, CategoryName::new_unchecked("Side hustle"));
        assert_eq!(
            get_categories(owner, Some(CategoryKind::Income), &connection)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn rejected_transaction_does_not_keep_new_category() {
        let (connection, owner, _) = setup();
        let form = TransactionFormData {
            kind: CategoryKind::Expense,
            amount: 0.0,
            date: date!(2025 - 01 - 01),
            title: "Nothing".to_owned(),
            notes: String::new(),
            category_id: None,
            new_category: "Brand new".to_owned(),
        };

        let result = save_transaction_form(owner, None, form, date!(2025 - 01 - 01), &connection);

        assert_eq!(result, Err(Error::InvalidAmount));
        assert_eq!(
            get_categories(owner, Some(CategoryKind::Expense), &connection)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn new_name_matching_existing_category_reuses_it() {
        let (connection, owner, category) = setup();

        let result = resolve_category(owner, CategoryKind::Expense, None, "GROCERIES", &connection);

        assert_eq!(result.map(|resolved| resolved.id), Ok(category.id));
    }
}

#[cfg(test)]
mod form_view_tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::UserID,
        category::{Category, CategoryKind, CategoryName},
        test_utils::{assert_form_radio_checked, assert_form_select, must_get_form},
        transaction::form::{FormTarget, TransactionFormDefaults, transaction_form},
    };

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                user_id: UserID::new(1),
                name: CategoryName::new_unchecked("Salary"),
                kind: CategoryKind::Income,
            },
            Category {
                id: 2,
                user_id: UserID::new(1),
                name: CategoryName::new_unchecked("Rent"),
                kind: CategoryKind::Expense,
            },
        ]
    }

    #[test]
    fn selects_given_category_and_kind() {
        let today = date!(2025 - 03 - 01);
        let defaults = TransactionFormDefaults {
            kind: CategoryKind::Income,
            category_id: Some(1),
            ..TransactionFormDefaults::new(today)
        };

        let markup = transaction_form(FormTarget::Create("/api/transactions"), &defaults, &categories(), "");
        let html = Html::parse_fragment(&markup.into_string());
        let form = must_get_form(&html);

        assert_form_radio_checked(&form, "kind", "Income");
        assert_form_select(&form, "category_id", "1");
    }

    #[test]
    fn defaults_to_other_option() {
        let today = date!(2025 - 03 - 01);

        let markup = transaction_form(
            FormTarget::Update("/api/transactions/1"),
            &TransactionFormDefaults::new(today),
            &categories(),
            "",
        );
        let html = Html::parse_fragment(&markup.into_string());
        let form = must_get_form(&html);

        assert_form_select(&form, "category_id", "");
        assert_eq!(form.value().attr("hx-put"), Some("/api/transactions/1"));
        assert_eq!(form.value().attr("hx-post"), None);
    }

    #[test]
    fn category_options_are_labelled_with_kind() {
        let today = date!(2025 - 03 - 01);

        let markup = transaction_form(
            FormTarget::Create("/api/transactions"),
            &TransactionFormDefaults::new(today),
            &categories(),
            "",
        );
        let html = Html::parse_fragment(&markup.into_string());

        let labels = html
            .select(&Selector::parse("select[name=category_id] option").unwrap())
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(labels, ["Other…", "Salary (Income)", "Rent (Expense)"]);
    }
}
