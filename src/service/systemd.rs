//! systemd and journald command lines for one unit

use crate::remote::command_line;

#[derive(Debug, Clone)]
pub struct Systemd {
    unit: String,
}

impl Systemd {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    pub fn daemon_reload(&self) -> String {
        "systemctl daemon-reload".to_string()
    }

    pub fn enable(&self) -> String {
        self.systemctl("enable")
    }

    pub fn restart(&self) -> String {
        self.systemctl("restart")
    }

    pub fn stop(&self) -> String {
        self.systemctl("stop")
    }

    pub fn status(&self) -> String {
        self.systemctl("status")
    }

    /// `journalctl [-f] -l -n <lines> -u <unit>`
    pub fn journal(&self, lines: u32, follow: bool) -> String {
        let lines = lines.to_string();
        let mut words = vec!["journalctl"];
        if follow {
            words.push("-f");
        }
        words.extend(["-l", "-n", lines.as_str(), "-u", self.unit.as_str()]);
        command_line(words)
    }

    fn systemctl(&self, verb: &str) -> String {
        command_line(["systemctl", verb, self.unit.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_commands() {
        let systemd = Systemd::new("gamehealthysrv.service");
        assert_eq!(systemd.daemon_reload(), "systemctl daemon-reload");
        assert_eq!(systemd.enable(), "systemctl enable gamehealthysrv.service");
        assert_eq!(systemd.restart(), "systemctl restart gamehealthysrv.service");
        assert_eq!(systemd.stop(), "systemctl stop gamehealthysrv.service");
        assert_eq!(systemd.status(), "systemctl status gamehealthysrv.service");
    }

    #[test]
    fn test_journal_follow_and_one_shot() {
        let systemd = Systemd::new("gamehealthysrv.service");
        assert_eq!(
            systemd.journal(20, true),
            "journalctl -f -l -n 20 -u gamehealthysrv.service"
        );
        assert_eq!(
            systemd.journal(100, false),
            "journalctl -l -n 100 -u gamehealthysrv.service"
        );
    }
}
