use bot_proto::Command;

/// Obstacle safety interlock. Only forward motion into a detected obstacle is
/// denied; retreat, turns and every non-motion command always pass.
pub fn allows(command: Command, obstacle: bool) -> bool {
    !(obstacle && command == Command::Forward)
}
