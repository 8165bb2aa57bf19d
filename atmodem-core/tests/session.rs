use std::collections::VecDeque;
use std::time::{Duration, Instant};

use atmodem_core::{
    Dialler, DiallerEvent, Dispatch, Modem, ModemInfo, Outcome, Registers,
    State,
};

/// Line that answers every call and echoes payload back, upper-cased.
#[derive(Default)]
struct ShoutingLine {
    up: bool,
    events: VecDeque<DiallerEvent>,
}

impl Dialler for ShoutingLine {
    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a> {
        if number.is_empty() || number.contains(char::is_whitespace) {
            return Outcome::error();
        }
        self.up = true;
        self.events
            .push_back(DiallerEvent::Connected(String::from("2400")));
        Outcome::Suspend
    }

    fn hangup(&mut self) {
        if std::mem::take(&mut self.up) {
            self.events.push_back(DiallerEvent::Disconnected);
        }
    }

    fn write(&mut self, data: &[u8]) {
        if self.up {
            self.events
                .push_back(DiallerEvent::Received(data.to_ascii_uppercase()));
        }
    }

    fn next_event(&mut self) -> Option<DiallerEvent> {
        self.events.pop_front()
    }
}

type BoxedModem = Modem<Vec<u8>, Box<dyn Dialler>>;

fn boxed_modem() -> BoxedModem {
    Modem::new(Vec::new(), Some(Box::new(ShoutingLine::default())))
}

fn feed(modem: &mut BoxedModem, text: &str, now: Instant) {
    for byte in text.bytes() {
        modem.dte_input_at(byte, now).expect("input failed");
        modem.service_dialler().expect("dialler failed");
    }
}

fn take_output(modem: &mut BoxedModem) -> String {
    let text = String::from_utf8_lossy(modem.dte()).into_owned();
    modem.dte_mut().clear();
    text
}

#[test]
fn full_call_lifecycle() {
    let mut modem = boxed_modem();
    let start = Instant::now() + Duration::from_secs(2);

    feed(&mut modem, "ATDT example:23\r", start);
    assert_eq!(modem.state(), State::Connected);
    assert_eq!(take_output(&mut modem), "ATDT example:23\r\nCONNECT 2400\r\n");

    feed(&mut modem, "hi there", start);
    assert_eq!(take_output(&mut modem), "HI THERE");

    let later = start + Duration::from_secs(2);
    feed(&mut modem, "+++", later);
    assert_eq!(modem.state(), State::EscapeWait);
    modem
        .check_escape_at(later + Duration::from_secs(2))
        .expect("tick failed");
    assert_eq!(take_output(&mut modem), "OK\r\n");
    assert!(modem.is_connected());

    feed(&mut modem, "ATH\r", later + Duration::from_secs(3));
    assert_eq!(take_output(&mut modem), "ATH\r\nNO CARRIER\r\n");
    assert!(!modem.is_connected());
    assert_eq!(modem.state(), State::EchoA);
}

#[test]
fn rejected_number_is_an_error() {
    let mut modem = boxed_modem();
    assert_eq!(modem.dte_command("d").expect("dispatch"), Dispatch::Error);
    assert_eq!(take_output(&mut modem), "ERROR\r\n");
}

#[test]
fn configured_identity_and_registers() {
    let info = ModemInfo {
        identity: String::from("test modem"),
        ..ModemInfo::default()
    };
    let mut modem = boxed_modem()
        .with_info(info)
        .with_registers(Registers::default().with_guard_time(50))
        .with_echo(false)
        .with_verbose(false);

    feed(&mut modem, "ATI0S12?\r", Instant::now());
    assert_eq!(take_output(&mut modem), "0\r\n");

    modem.dte_command("v1i0").expect("dispatch");
    assert_eq!(take_output(&mut modem), "test modem\r\n");

    modem.dte_command("s12?").expect("dispatch");
    assert_eq!(take_output(&mut modem), "50\r\nOK\r\n");
}

#[test]
fn numeric_connect_rate() {
    let mut modem = boxed_modem().with_verbose(false).with_echo(false);
    feed(&mut modem, "ATDx:1\r", Instant::now());
    assert_eq!(take_output(&mut modem), "10\r\n");
}
