use super::*;

fn new_program() -> NewProgram {
    NewProgram {
        name: "Soup".into(),
        food: "Tomato soup".into(),
        time_in_seconds: 150,
        power: 6,
        heating_char: 'S',
        instructions: Some("  Stir halfway.  ".into()),
    }
}

#[test]
fn accepts_every_time_and_power_in_range() {
    for time in MIN_TIME..=MAX_TIME {
        for power in MIN_POWER..=MAX_POWER {
            let input = validate_heating_input(Some(time), Some(power), false).expect("valid");
            assert_eq!(i64::from(input.time), time);
            assert_eq!(i64::from(input.power), power);
        }
    }
}

#[test]
fn quick_start_ignores_input() {
    let input = validate_heating_input(Some(999), Some(-1), true).expect("quick start");
    assert_eq!(input.time, 30);
    assert_eq!(input.power, 10);
    assert!(input.conversion_note.is_none());
}

#[test]
fn power_defaults_to_ten() {
    let input = validate_heating_input(Some(45), None, false).expect("valid");
    assert_eq!(input.power, 10);
}

#[test]
fn rejects_out_of_range_power_before_checking_time() {
    for power in [0, 11, -3] {
        let err = validate_heating_input(None, Some(power), false).expect_err("power");
        assert!(matches!(err, HeatingError::Validation(ref m) if m.contains("power")));
    }
}

#[test]
fn time_is_mandatory() {
    let err = validate_heating_input(None, Some(5), false).expect_err("time");
    assert!(matches!(err, HeatingError::Validation(ref m) if m.contains("mandatory")));
}

#[test]
fn rejects_out_of_range_time() {
    for time in [0, 121, -10] {
        let err = validate_heating_input(Some(time), None, false).expect_err("time");
        assert!(matches!(err, HeatingError::Validation(ref m) if m.contains("Invalid time")));
    }
}

#[test]
fn conversion_note_only_strictly_between_80_and_100() {
    let note = validate_heating_input(Some(90), None, false)
        .expect("valid")
        .conversion_note
        .expect("note");
    assert!(note.contains("1 minute(s) 30 second(s)"));

    for time in [80, 100, 30, 120] {
        let input = validate_heating_input(Some(time), None, false).expect("valid");
        assert!(input.conversion_note.is_none(), "unexpected note for {time}");
    }
    assert!(validate_heating_input(Some(81), None, false)
        .expect("valid")
        .conversion_note
        .is_some());
    assert!(validate_heating_input(Some(99), None, false)
        .expect("valid")
        .conversion_note
        .is_some());
}

#[test]
fn new_program_is_trimmed_and_marked_custom() {
    let definition = validate_new_program(&new_program()).expect("valid");
    assert_eq!(definition.name, "Soup");
    assert_eq!(definition.instructions.as_deref(), Some("Stir halfway."));
    assert!(!definition.is_predefined);
}

#[test]
fn new_program_allows_times_beyond_manual_limit() {
    let mut program = new_program();
    program.time_in_seconds = 900;
    assert_eq!(
        validate_new_program(&program).expect("valid").time_in_seconds,
        900
    );
}

#[test]
fn new_program_rejects_bad_fields() {
    let cases: Vec<(&str, Box<dyn Fn(&mut NewProgram)>)> = vec![
        ("blank name", Box::new(|p| p.name = "   ".into())),
        ("blank food", Box::new(|p| p.food = String::new())),
        ("zero time", Box::new(|p| p.time_in_seconds = 0)),
        ("negative time", Box::new(|p| p.time_in_seconds = -30)),
        ("power too low", Box::new(|p| p.power = 0)),
        ("power too high", Box::new(|p| p.power = 11)),
        ("reserved marker", Box::new(|p| p.heating_char = '*')),
        ("whitespace marker", Box::new(|p| p.heating_char = ' ')),
    ];

    for (label, mutate) in cases {
        let mut program = new_program();
        mutate(&mut program);
        let err = validate_new_program(&program).expect_err(label);
        assert!(matches!(err, HeatingError::Validation(_)), "{label}");
    }
}

#[test]
fn blank_instructions_become_none() {
    let mut program = new_program();
    program.instructions = Some("   ".into());
    assert!(validate_new_program(&program)
        .expect("valid")
        .instructions
        .is_none());
}
