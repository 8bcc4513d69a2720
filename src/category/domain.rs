//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::UserID};

/// The longest a category name may be, counted in characters.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;

/// Database identifier for a category.
pub type CategoryId = i64;

/// Whether money is coming in or going out.
///
/// Both categories and transactions carry a kind, and a transaction may only
/// use a category of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    /// Both kinds, in the order they are shown in forms and reports.
    pub const ALL: [CategoryKind; 2] = [CategoryKind::Income, CategoryKind::Expense];

    /// The name of the kind as stored in the database and sent in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
        }
    }
}

impl Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = s.trim();

        CategoryKind::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(kind))
            .ok_or_else(|| Error::InvalidCategoryKind(kind.to_owned()))
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A category name with surrounding whitespace removed and inner runs of
/// whitespace collapsed to a single space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Normalise and validate a category name.
    ///
    /// # Errors
    ///
    /// This function will return an:
    /// - [Error::EmptyCategoryName] if `name` is blank,
    /// - [Error::CategoryNameTooLong] if the normalised name is longer than
    ///   [MAX_CATEGORY_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            Err(Error::CategoryNameTooLong(MAX_CATEGORY_NAME_LENGTH))
        } else {
            Ok(Self(name))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is already normalised.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The form used to compare names, folded to lowercase across all of Unicode.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's named bucket for transactions, e.g. 'Groceries' or 'Salary'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserID,
    pub name: CategoryName,
    pub kind: CategoryKind,
}

/// Form data for category creation and editing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    pub kind: CategoryKind,
}


#[cfg(test)]
mod category_kind_tests {
    use crate::{Error, category::CategoryKind};

    #[test]
    fn parses_ignoring_case() {
        assert_eq!("income".parse(), Ok(CategoryKind::Income));
        assert_eq!(" EXPENSE ".parse(), Ok(CategoryKind::Expense));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(
            "Both".parse::<CategoryKind>(),
            Err(Error::InvalidCategoryKind("Both".to_owned()))
        );
    }

    #[test]
    fn display_matches_stored_value() {
        assert_eq!(CategoryKind::Income.to_string(), "Income");
        assert_eq!(CategoryKind::Expense.to_string(), "Expense");
    }
}
