use crate::deploy::DeployError;
use std::fmt;
use std::str::FromStr;

/// A remote target written as `[user@]address[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost {
    pub user: Option<String>,
    pub address: String,
    pub port: Option<u16>,
}

impl RemoteHost {
    /// Destination argument for ssh and scp (`user@address`).
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.address),
            None => self.address.clone(),
        }
    }
}

impl fmt::Display for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.destination())?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

impl FromStr for RemoteHost {
    type Err = DeployError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DeployError::InvalidHost {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty host"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid("host must not contain whitespace"));
        }

        let (user, rest) = match trimmed.rsplit_once('@') {
            Some((user, _)) if user.is_empty() => return Err(invalid("empty user")),
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, trimmed),
        };

        // Bracketed IPv6 literals carry their own colons.
        let (address, port) = if let Some(stripped) = rest.strip_prefix('[') {
            let (addr, tail) = stripped
                .split_once(']')
                .ok_or_else(|| invalid("unterminated '['"))?;
            match tail.strip_prefix(':') {
                Some(port) => (addr, Some(port)),
                None if tail.is_empty() => (addr, None),
                None => return Err(invalid("unexpected text after ']'")),
            }
        } else {
            match rest.split_once(':') {
                Some((addr, port)) => (addr, Some(port)),
                None => (rest, None),
            }
        };

        if address.is_empty() {
            return Err(invalid("empty address"));
        }

        let port = port
            .map(|p| {
                p.parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| invalid("port must be a number between 1 and 65535"))
            })
            .transpose()?;

        Ok(Self {
            user,
            address: address.to_string(),
            port,
        })
    }
}
