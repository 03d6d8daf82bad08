/*
[INPUT]:  Interactive terminal session
[OUTPUT]: CLI helper commands
[POS]:    CLI layer - module wiring
[UPDATE]: When adding interactive commands
*/

pub mod init;
