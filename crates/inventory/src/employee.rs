use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, EmployeeId, Entity, UserId};

use crate::non_blank;

/// Staff record; movements name their responsible person in free text, so
/// this is a directory, not a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl NewEmployee {
    pub fn validate(self, created_by: UserId, created_at: DateTime<Utc>) -> DomainResult<Employee> {
        let name = non_blank(Some(self.name))
            .ok_or_else(|| DomainError::validation("name", "name cannot be empty"))?;
        let email = email_address(self.email)?;

        Ok(Employee {
            id: EmployeeId::new(),
            name,
            email,
            department: non_blank(self.department).unwrap_or_default(),
            position: non_blank(self.position).unwrap_or_default(),
            is_active: true,
            created_at,
            created_by,
        })
    }
}

fn email_address(email: Option<String>) -> DomainResult<Option<String>> {
    match non_blank(email) {
        Some(email) if !email.contains('@') => Err(DomainError::validation(
            "email",
            format!("'{email}' is not an email address"),
        )),
        email => Ok(email),
    }
}

/// Edit of an existing employee. `None` leaves a field as it is; a blank
/// value clears the optional ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeePatch {
    name: Option<String>,
    email: Option<Option<String>>,
    department: Option<String>,
    position: Option<String>,
}

impl EmployeeUpdate {
    pub fn validate(self) -> DomainResult<EmployeePatch> {
        let name = match self.name {
            Some(name) => Some(
                non_blank(Some(name))
                    .ok_or_else(|| DomainError::validation("name", "name cannot be empty"))?,
            ),
            None => None,
        };
        let email = match self.email {
            Some(email) => Some(email_address(Some(email))?),
            None => None,
        };

        Ok(EmployeePatch {
            name,
            email,
            department: self.department.map(|d| d.trim().to_string()),
            position: self.position.map(|p| p.trim().to_string()),
        })
    }
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
        if let Some(department) = &self.department {
            employee.department = department.clone();
        }
        if let Some(position) = &self.position {
            employee.position = position.clone();
        }
    }
}
