//! Replay a short captured session and print the resolution reports

use shakeit_core::{replay_session, ShakeConfig};

fn main() {
    let session = r#"
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.000Z","kind":"sample","x":0.4,"y":2.1,"z":0.2}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.020Z","kind":"begin"}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.040Z","kind":"sample","x":0.3,"y":-2.6,"z":0.1}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.060Z","kind":"sample","x":1.9,"y":2.4,"z":0.0}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.080Z","kind":"end"}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:01.000Z","kind":"begin"}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:01.020Z","kind":"sample","x":-3.2,"y":0.2,"z":0.0}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:01.040Z","kind":"cancel"}
"#;

    match replay_session(session.to_string(), &ShakeConfig::planar()) {
        Ok(reports) => {
            for report in reports {
                println!("{report}");
            }
        }
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
