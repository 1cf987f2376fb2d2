use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use str4500::{ClientConfig, CommandResponse, Error, PowerMode, Status, Str4500, Timestamp};

/// Answers every request with `<msg><status>1</status><data>{request}</data></msg>`
/// until the client hangs up.
fn spawn_echo_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = [0u8; 1024];
                loop {
                    let n = match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    let req = String::from_utf8_lossy(&buf[..n]);
                    let reply = format!("<msg><status>1</status><data>{req}</data></msg>");
                    if stream.write_all(reply.as_bytes()).is_err() {
                        break;
                    }
                }
            });
        }
    });
    port
}

fn echoed(data: &str) -> CommandResponse {
    CommandResponse::new(Status::InvalidScenario, Some(data.to_string()))
}

fn connect(port: u16) -> Str4500 {
    Str4500::connect(ClientConfig::new("127.0.0.1").with_port(port)).unwrap()
}

#[test]
fn echo_sim() {
    let port = spawn_echo_server();
    let mut dev = connect(port);

    assert_eq!(dev.status().unwrap(), echoed("NULL"));
    assert_eq!(dev.run_scenario().unwrap(), echoed("RU"));
    assert_eq!(dev.scenario_duration().unwrap().as_deref(), Some("SC_DURATION"));
    assert_eq!(dev.end_scenario(0, false, Timestamp::Now).unwrap(), echoed("-,EN,0,0"));
    assert_eq!(dev.end_scenario(1, false, Timestamp::Now).unwrap(), echoed("-,EN,1,0"));
    assert_eq!(dev.rewind_scenario().unwrap(), echoed("RW"));

    assert_eq!(dev.set_power(true, Timestamp::Now).unwrap(), echoed("-,POW_ON,v1_a1,1,0,1,1"));
    assert_eq!(dev.set_power(false, Timestamp::Now).unwrap(), echoed("-,POW_ON,v1_a1,0,0,1,1"));
    assert_eq!(
        dev.set_power_mode(PowerMode::Relative, Timestamp::Now).unwrap(),
        echoed("-,POW_MODE,v1_a1,1,0,1,1")
    );
    for power in 0..10 {
        let level = f64::from(power);
        assert_eq!(
            dev.set_power_level(level, false, Timestamp::Now).unwrap(),
            echoed(&format!("-,POW_LEV,v1_a1,{level:?},0,1,1,0"))
        );
    }
    assert_eq!(dev.set_prn(false, Timestamp::Now).unwrap(), echoed("-,PRN_CODE,0,1,0"));
    assert_eq!(dev.enable_hardware(true).unwrap(), echoed("HARDWARE_ON,1"));
    assert_eq!(dev.enable_popups(false).unwrap(), echoed("POPUPS_ON,0"));

    for chan in 0..=11u8 {
        let mut ch = dev.channel(chan).unwrap();
        assert_eq!(
            ch.set_power(true, Timestamp::Now).unwrap(),
            echoed(&format!("-,POW_ON,v1_a1,1,{chan},1,0"))
        );
        assert_eq!(
            ch.set_prn(true, Timestamp::Now).unwrap(),
            echoed(&format!("-,PRN_CODE,{chan},0,1"))
        );
    }
    for sat in 1..=32u8 {
        let mut s = dev.satellite(sat).unwrap();
        assert_eq!(
            s.set_power_mode(PowerMode::Absolute, Timestamp::Now).unwrap(),
            echoed(&format!("-,POW_MODE,v1_a1,0,{sat},0,0"))
        );
    }

    dev.close().unwrap();
}

#[test]
fn validation_happens_before_io() {
    let port = spawn_echo_server();
    let mut dev = connect(port);
    assert!(matches!(dev.set_trigger(7), Err(Error::Validation(_))));
    assert!(matches!(dev.channel(12), Err(Error::Validation(_))));
    // the connection is still in sync: next reply matches the next request
    assert_eq!(dev.set_trigger(2).unwrap(), echoed("TR,2"));
}

#[test]
fn time_requires_integer_data() {
    let port = spawn_echo_server();
    let mut dev = connect(port);
    // the echo server answers TIME with "TIME", which is not a number
    assert!(matches!(dev.time(), Err(Error::Protocol(_))));
}

#[test]
fn status_probe_failure_fails_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (mut s, _) = listener.accept().unwrap();
        let mut buf = [0u8; 64];
        let _ = s.read(&mut buf);
        let _ = s.write_all(b"<msg><status>9</status></msg>");
    });
    let err = Str4500::connect(ClientConfig::new("127.0.0.1").with_port(port)).unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}
