use std::time::{Duration, Instant};

use atmodem_core::{Modem, State};
use atmodem_dial::LoopbackDialler;

type LoopbackModem = Modem<Vec<u8>, LoopbackDialler>;

fn modem() -> LoopbackModem {
    Modem::new(
        Vec::new(),
        Some(LoopbackDialler::new().with_connect_rate("9600")),
    )
}

fn type_in(modem: &mut LoopbackModem, text: &str, at: Instant) {
    for byte in text.bytes() {
        modem.dte_input_at(byte, at).expect("input failed");
        modem.service_dialler().expect("dialler failed");
    }
}

fn take_output(modem: &mut LoopbackModem) -> String {
    let text = String::from_utf8_lossy(modem.dte()).into_owned();
    modem.dte_mut().clear();
    text
}

#[test]
fn payload_comes_back_in_data_mode() {
    let mut modem = modem().with_echo(false);
    let start = Instant::now();

    type_in(&mut modem, "ATDloop:1\r", start);
    assert_eq!(take_output(&mut modem), "CONNECT 9600\r\n");
    assert_eq!(modem.state(), State::Connected);

    type_in(&mut modem, "hello +", start);
    assert_eq!(take_output(&mut modem), "hello +");
}

#[test]
fn online_command_mode_and_back() {
    let mut modem = modem().with_echo(false);
    let start = Instant::now() + Duration::from_secs(5);
    type_in(&mut modem, "ATDloop:1\r", start);
    take_output(&mut modem);

    let escape = start + Duration::from_secs(2);
    type_in(&mut modem, "+++", escape);
    modem
        .check_escape_at(escape + Duration::from_secs(2))
        .expect("tick failed");
    assert_eq!(take_output(&mut modem), "OK\r\n");
    assert!(modem.is_connected());

    let later = escape + Duration::from_secs(3);
    type_in(&mut modem, "ATO\r", later);
    assert_eq!(take_output(&mut modem), "CONNECT\r\n");
    assert_eq!(modem.state(), State::Connected);

    type_in(&mut modem, "again", later);
    assert_eq!(take_output(&mut modem), "again");
}

#[test]
fn hang_up_reports_no_carrier() {
    let mut modem = modem().with_echo(false).with_verbose(false);
    let start = Instant::now() + Duration::from_secs(5);
    type_in(&mut modem, "ATDloop:1\r", start);
    assert_eq!(take_output(&mut modem), "12\r\n");

    let escape = start + Duration::from_secs(2);
    type_in(&mut modem, "+++", escape);
    modem
        .check_escape_at(escape + Duration::from_secs(2))
        .expect("tick failed");
    take_output(&mut modem);

    type_in(&mut modem, "ATH\r", escape + Duration::from_secs(3));
    assert_eq!(take_output(&mut modem), "3\r\n");
    assert!(!modem.is_connected());
    assert!(!modem.dialler_mut().expect("dialler").is_active());
}

#[test]
fn key_while_dialling_aborts_once() {
    let mut modem = modem().with_echo(false);
    modem.dte_command("dhost:1").expect("dispatch");
    assert_eq!(modem.state(), State::Connecting);

    modem.dte_input(b'x').expect("input failed");
    modem.service_dialler().expect("dialler failed");

    assert_eq!(take_output(&mut modem), "NO CARRIER\r\n");
    assert_eq!(modem.state(), State::EchoA);
    assert!(!modem.is_connected());
    assert!(!modem.dialler_mut().expect("dialler").is_active());
}
