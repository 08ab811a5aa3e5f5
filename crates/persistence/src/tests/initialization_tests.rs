// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Persistence, PersistenceError};

#[test]
fn test_new_in_memory_initializes_schema() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    // Migrations ran: an empty query against a migrated table succeeds.
    assert_eq!(persistence.jobsite_ids().unwrap(), Vec::<i64>::new());
}

#[test]
fn test_foreign_key_enforcement_is_active() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence.verify_foreign_key_enforcement().unwrap();
}

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first: Persistence = Persistence::new_in_memory().unwrap();
    let mut second: Persistence = Persistence::new_in_memory().unwrap();

    first.insert_jobsite("North Yard").unwrap();
    assert_eq!(first.jobsite_ids().unwrap().len(), 1);
    assert!(second.jobsite_ids().unwrap().is_empty());
}

#[test]
fn test_org_config_missing_until_seeded() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let result = persistence.org_config();
    assert_eq!(result.unwrap_err(), PersistenceError::OrgConfigMissing);
}
