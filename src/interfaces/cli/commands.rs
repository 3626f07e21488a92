use super::{COMMANDS, ChatInterface};

impl ChatInterface {
    pub(super) fn handle_command(&mut self, input: &str) {
        let cmd = input.split_whitespace().next().unwrap_or(input);

        match cmd {
            "/help" => {
                self.cmd_output_lines.clear();
                self.push_cmd_output("Commands:".to_string());
                for info in COMMANDS {
                    self.push_cmd_output(format!("  {:<14}{}", info.name, info.description));
                }
                self.push_cmd_output(String::new());
                self.push_cmd_output(
                    "Type a question and press Enter. Proposed queries run only after you press y."
                        .to_string(),
                );
            }
            "/health" => {
                self.cmd_output_lines.clear();
                self.push_cmd_output(format!("Checking {}...", self.backend.endpoint()));
                self.spawn_health_check();
            }
            "/collections" => self.fetch_collections(),
            "/clear" => {
                self.display_from = self.session.log().len();
                self.cmd_output_lines.clear();
                self.cmd_output_visible = false;
                self.scroll_offset = 0;
            }
            "/quit" | "/exit" => {
                self.should_quit = true;
            }
            _ => {
                self.cmd_output_lines.clear();
                self.push_cmd_output(format!(
                    "Unknown command: {}. Type /help for available commands.",
                    cmd
                ));
            }
        }
    }
}
