use farm_agent::devices::security::door_lock::OPEN_PULSE;
use farm_agent::devices::{AngleSensor, Buzzer, DoorLock, Fan, RgbLedStick};
use farm_agent::hal::sim::{SimAccelerometer, SimLedStrip, SimPin, SimServo, SimulatedHardware};
use farm_agent::hal::{Acceleration, Rgb};
use farm_agent::{
    Actuator, Command, CommandType, CommandUnit, CommandValue, Farm, LocalGateway, Reading, ReadingType,
    ReadingUnit, ReadingValue, Sensor, Subsystem, SubsystemKind, Wiring,
};
use std::sync::{Arc, Mutex};

/// Every command shape the gateway can produce, plus a few it cannot.
fn command_grid() -> Vec<Command> {
    let values = [
        CommandValue::Bool(true),
        CommandValue::Bool(false),
        CommandValue::Number(1.0),
        CommandValue::Text("on".to_string()),
    ];
    CommandType::ALL
        .iter()
        .flat_map(|command_type| {
            values
                .iter()
                .map(move |value| Command::new(*command_type, CommandUnit::Bool, value.clone()))
        })
        .collect()
}

fn simulated_farm(hardware: &SimulatedHardware) -> Farm {
    Farm::with_hardware(
        hardware.hardware_set(),
        &Wiring::default(),
        Arc::new(LocalGateway::default()),
    )
}

#[test]
fn test_default_container_layout() {
    let hardware = SimulatedHardware::new();
    let farm = simulated_farm(&hardware);

    let layout: Vec<_> = farm
        .subsystems()
        .iter()
        .map(|subsystem| (subsystem.kind(), subsystem.sensor_count(), subsystem.actuator_count()))
        .collect();
    assert_eq!(
        layout,
        vec![
            (SubsystemKind::GeoLocation, 3, 0),
            (SubsystemKind::Security, 5, 2),
            (SubsystemKind::Plant, 4, 2),
        ]
    );
}

#[test]
fn test_readings_follow_sensor_order() {
    let hardware = SimulatedHardware::new();
    let farm = simulated_farm(&hardware);
    let telemetry = farm.collect_telemetry();

    let types = |kind| -> Vec<ReadingType> {
        telemetry
            .get(kind)
            .unwrap()
            .iter()
            .map(Reading::reading_type)
            .collect()
    };

    assert_eq!(
        types(SubsystemKind::Plant),
        vec![
            ReadingType::SoilMoisture,
            ReadingType::Temperature,
            ReadingType::Humidity,
            ReadingType::WaterLevel,
            ReadingType::RgbLedStick,
        ]
    );
    assert_eq!(
        types(SubsystemKind::Security),
        vec![
            ReadingType::Noise,
            ReadingType::Motion,
            ReadingType::DoorLocked,
            ReadingType::Luminosity,
            ReadingType::Buzzer,
        ]
    );
    assert_eq!(
        types(SubsystemKind::GeoLocation),
        vec![
            ReadingType::Pitch,
            ReadingType::Roll,
            ReadingType::GeoLocation,
            ReadingType::Vibration,
        ]
    );
}

#[test]
fn test_failing_sensor_does_not_abort_the_cycle() {
    let hardware = SimulatedHardware::new();
    hardware.climate.set_climate(None);
    hardware.accelerometer.set_sample(None);
    hardware.gps.set_repeat(None);
    let farm = simulated_farm(&hardware);

    let telemetry = farm.collect_telemetry();
    assert!(telemetry.get(SubsystemKind::GeoLocation).unwrap().is_empty());

    let plant: Vec<_> = telemetry
        .get(SubsystemKind::Plant)
        .unwrap()
        .iter()
        .map(Reading::reading_type)
        .collect();
    assert_eq!(
        plant,
        vec![ReadingType::SoilMoisture, ReadingType::WaterLevel, ReadingType::RgbLedStick]
    );
}

#[test]
fn test_control_implies_validate() {
    let actuators: Vec<Arc<dyn Actuator>> = vec![
        Arc::new(Fan::new(Box::new(SimPin::default()))),
        Arc::new(Buzzer::new(Box::new(SimPin::default()))),
        Arc::new(DoorLock::new(Box::new(SimServo::default()))),
        Arc::new(RgbLedStick::new(Box::new(SimLedStrip::new(10)), Rgb::RED)),
    ];

    for actuator in &actuators {
        for command in command_grid() {
            let valid = actuator.validate_command(&command);
            let applied = actuator.control_actuator(&command);
            assert!(!applied || valid, "{} applied without validating", command);
        }
    }
}

#[test]
fn test_repeated_command_is_idempotent() {
    let servo = SimServo::default();
    let lock = DoorLock::new(Box::new(servo.clone()));
    let open = Command::new(CommandType::MicroServoMotor, CommandUnit::Bool, true);

    assert!(lock.control_actuator(&open));
    let after_one = (servo.current_pulse(), lock.read());
    assert!(lock.control_actuator(&open));
    let after_two = (servo.current_pulse(), lock.read());

    assert_eq!(after_one.0, Some(OPEN_PULSE));
    assert_eq!(after_one.0, after_two.0);
    assert_eq!(after_one.1[0].value(), after_two.1[0].value());
}

#[test]
fn test_fan_command_reaches_only_the_fan() {
    let fan_pin = SimPin::default();
    let buzzer_pin = SimPin::default();
    let servo = SimServo::default();

    let plant = Subsystem::builder(SubsystemKind::Plant)
        .device(Arc::new(Fan::new(Box::new(fan_pin.clone()))))
        .build();
    let security = Subsystem::builder(SubsystemKind::Security)
        .device(Arc::new(Buzzer::new(Box::new(buzzer_pin.clone()))))
        .actuator(Arc::new(DoorLock::new(Box::new(servo.clone()))))
        .build();
    let farm = Farm::new(vec![plant, security], Arc::new(LocalGateway::default()));

    farm.dispatch(&Command::new(CommandType::Fan, CommandUnit::Bool, true)).unwrap();

    assert!(fan_pin.level());
    assert!(!buzzer_pin.level());
    assert_eq!(servo.current_pulse(), None);
}

#[test]
fn test_empty_command_list_changes_nothing() {
    let hardware = SimulatedHardware::new();
    let farm = simulated_farm(&hardware);
    let before = farm.collect_telemetry();

    for subsystem in farm.subsystems() {
        subsystem.control_actuators(&[]).unwrap();
    }

    assert!(!hardware.fan.level());
    assert!(!hardware.buzzer.level());
    assert_eq!(hardware.servo.current_pulse(), None);
    let after = farm.collect_telemetry();
    let actuator_state = |telemetry: &farm_agent::Telemetry| -> Vec<ReadingValue> {
        telemetry
            .get(SubsystemKind::Plant)
            .unwrap()
            .iter()
            .filter(|reading| reading.reading_type() == ReadingType::RgbLedStick)
            .map(|reading| reading.value().clone())
            .collect()
    };
    assert_eq!(actuator_state(&before), actuator_state(&after));
}

#[test]
fn test_reading_round_trip() {
    let readings = [
        Reading::new(true, ReadingType::Fan, ReadingUnit::Bool),
        Reading::number(41.06, ReadingType::Noise, ReadingUnit::Decibel).unwrap(),
        Reading::number(-3.5, ReadingType::Pitch, ReadingUnit::Degrees).unwrap(),
    ];

    for reading in readings {
        let parsed = Reading::from_json(&reading.to_json().unwrap()).unwrap();
        assert_eq!(parsed.value(), reading.value());
        assert_eq!(parsed.reading_type(), reading.reading_type());
        assert_eq!(parsed.reading_unit(), reading.reading_unit());
        assert_eq!(parsed.timestamp(), reading.timestamp());
    }
}

#[test]
fn test_level_container_omits_pitch() {
    let accelerometer = SimAccelerometer::default();
    accelerometer.set_sample(Some(Acceleration::new(0.5, 0.0, 0.0)));
    let sensor = AngleSensor::new(Arc::new(Mutex::new(accelerometer)));

    let readings = sensor.read();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].reading_type(), ReadingType::Roll);
}
