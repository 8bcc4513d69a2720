//! Database operations for categories.
//!
//! Every function takes the owner's [UserID] and only ever touches rows that
//! belong to that user.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryKind, CategoryName},
};

/// Initialize the category table and indexes.
///
/// Names are unique per owner and kind, ignoring case. `name_key` holds the
/// case-folded name from [CategoryName::key] since `COLLATE NOCASE` only folds
/// ASCII letters.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('Income', 'Expense'))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_user_kind_name
            ON category(user_id, kind, name_key);",
    )?;

    Ok(())
}

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategoryName] if `owner` already has a
/// category of the same kind with this name, ignoring case.
pub fn create_category(
    owner: UserID,
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (user_id, name, name_key, kind) VALUES (?1, ?2, ?3, ?4);",
        (owner.as_i64(), name.as_ref(), name.key(), kind),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id: owner,
        name,
        kind,
    })
}

/// Retrieve one of `owner`'s categories by ID.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    owner: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &owner.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve `owner`'s categories ordered by kind and then name.
///
/// Pass a `kind` to only get the categories of that kind.
pub fn get_categories(
    owner: UserID,
    kind: Option<CategoryKind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category
            WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
            ORDER BY kind ASC, name_key ASC;",
        )?
        .query_map((owner.as_i64(), kind), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category or change its kind.
///
/// # Errors
///
/// This function will return an:
/// - [Error::UpdateMissingCategory] if `owner` has no such category,
/// - [Error::DuplicateCategoryName] if the new name clashes with another category,
/// - [Error::CategoryKindInUse] if the kind changes while transactions use the category.
pub fn update_category(
    owner: UserID,
    category_id: CategoryId,
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<(), Error> {
    let tx = connection.unchecked_transaction()?;

    let current_kind: Option<CategoryKind> = tx
        .query_row(
            "SELECT kind FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, owner.as_i64()),
            |row| row.get(0),
        )
        .optional()?;

    let Some(current_kind) = current_kind else {
        return Err(Error::UpdateMissingCategory);
    };

    if current_kind != kind && count_transactions_in_category(category_id, &tx)? > 0 {
        return Err(Error::CategoryKindInUse);
    }

    tx.execute(
        "UPDATE category SET name = ?1, name_key = ?2, kind = ?3 WHERE id = ?4 AND user_id = ?5",
        (name.as_ref(), name.key(), kind, category_id, owner.as_i64()),
    )?;

    tx.commit()?;

    Ok(())
}

/// Delete one of `owner`'s categories, unless transactions still use it.
///
/// The check and the delete run in one SQL transaction so a transaction
/// cannot be attached to the category in between.
///
/// # Errors
///
/// This function will return an:
/// - [Error::CategoryInUse] if any transaction refers to the category,
///   in which case nothing is deleted,
/// - [Error::DeleteMissingCategory] if `owner` has no such category.
pub fn delete_category(
    owner: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let tx = connection.unchecked_transaction()?;

    let is_owned = tx
        .query_row(
            "SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, owner.as_i64()),
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !is_owned {
        return Err(Error::DeleteMissingCategory);
    }

    if count_transactions_in_category(category_id, &tx)? > 0 {
        return Err(Error::CategoryInUse);
    }

    tx.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, owner.as_i64()),
    )?;

    tx.commit()?;

    Ok(())
}

/// Return the category of `kind` called `name` (ignoring case), creating it
/// first if `owner` does not have one yet.
///
/// Calling this again with the same arguments returns the same category.
pub fn get_or_create_category(
    owner: UserID,
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    let existing = connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category
            WHERE user_id = ?1 AND kind = ?2 AND name_key = ?3;",
        )?
        .query_row((owner.as_i64(), kind, name.key()), map_row)
        .optional()?;

    match existing {
        Some(category) => Ok(category),
        None => create_category(owner, name, kind, connection),
    }
}

/// Count how many of `owner`'s transactions use each of their categories.
///
/// Categories without transactions are left out of the map.
pub fn count_transactions_per_category(
    owner: UserID,
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM \"transaction\"
            WHERE user_id = ?1
            GROUP BY category_id",
        )?
        .query_map((owner.as_i64(),), |row| {
            let category_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((category_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

fn count_transactions_in_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM \"transaction\" WHERE category_id = ?1",
            (category_id,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let raw_name: String = row.get(2)?;
    let kind = row.get(3)?;

    Ok(Category {
        id,
        user_id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
    })
}
