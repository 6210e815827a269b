use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ConvertError;

/// Number of colon-separated fields in a `users.auth.php` line:
/// `login:passwordhash:displayName:email:groups`
const USER_FIELDS: usize = 5;

/// Display name and email of a registered wiki user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub display_name: String,
    pub email: String,
}

/// Login name to user details, loaded once from the wiki's user directory
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    /// Parse a user directory file.
    ///
    /// Blank lines and `#` comments are skipped; every other line must have
    /// exactly five fields.
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Like [`UserDirectory::load`], but an absent file yields an empty directory.
    pub fn load_optional(path: &Path) -> Result<Self, ConvertError> {
        if !path.exists() {
            log::info!(
                "No user directory at {}, authors will not be resolved",
                path.display()
            );
            return Ok(Self::default());
        }

        let directory = Self::load(path)?;
        log::info!(
            "Loaded {} users from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Parse user directory content; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConvertError> {
        let mut users = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() != USER_FIELDS {
                return Err(ConvertError::MalformedUserRecord {
                    path: path.to_path_buf(),
                    line: index + 1,
                    detail: format!(
                        "expected {USER_FIELDS} colon-separated fields, found {}",
                        fields.len()
                    ),
                });
            }

            users.insert(
                fields[0].to_string(),
                UserRecord {
                    display_name: fields[2].to_string(),
                    email: fields[3].to_string(),
                },
            );
        }

        Ok(Self { users })
    }

    pub fn get(&self, login: &str) -> Option<&UserRecord> {
        self.users.get(login)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
