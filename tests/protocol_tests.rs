use broadside::{
    parse_ship_list, Action, Event, MatchmakingCommand, Orientation, ParseError, Presence, ShipPlacement,
    ShotReport, ShotResult,
};

#[test]
fn parses_game_actions() {
    assert_eq!(Action::parse("Hello|42"), Ok(Action::Hello { user: 42 }));
    assert_eq!(Action::parse("createGame"), Ok(Action::CreateGame));
    assert_eq!(Action::parse("playBot"), Ok(Action::PlayBot));
    assert_eq!(Action::parse("joinGame|3"), Ok(Action::JoinGame { game: 3 }));
    assert_eq!(Action::parse("passTurn|3"), Ok(Action::PassTurn { game: 3 }));
    assert_eq!(Action::parse("Attack|3|4|9"), Ok(Action::Attack { game: 3, x: 4, y: 9 }));
    assert_eq!(Action::parse("abandon|3"), Ok(Action::Abandon { game: 3 }));
    assert_eq!(Action::parse("rematch|3"), Ok(Action::Rematch { game: 3 }));
    assert_eq!(Action::parse("getState|3"), Ok(Action::GetState { game: 3 }));
}

#[test]
fn action_names_ignore_case_and_line_endings() {
    assert_eq!(Action::parse("ATTACK|1|0|0\r\n"), Ok(Action::Attack { game: 1, x: 0, y: 0 }));
    assert_eq!(
        Action::parse("matchmaking|RANDOM"),
        Ok(Action::Matchmaking(MatchmakingCommand::Random))
    );
    assert_eq!(
        Action::parse("Matchmaking|cancel"),
        Ok(Action::Matchmaking(MatchmakingCommand::Cancel))
    );
}

#[test]
fn parses_ship_lists() {
    let action = Action::parse("placeShips|5|7|0,0,5,h;0,2,4,horizontal;9,0,3,V").unwrap();
    assert_eq!(
        action,
        Action::PlaceShips {
            game: 5,
            player: 7,
            ships: vec![
                ShipPlacement::new(0, 0, 5, Orientation::Horizontal),
                ShipPlacement::new(0, 2, 4, Orientation::Horizontal),
                ShipPlacement::new(9, 0, 3, Orientation::Vertical),
            ],
        }
    );
    assert!(matches!(parse_ship_list("0,0,5"), Err(ParseError::Malformed { .. })));
    assert!(matches!(parse_ship_list("0,0,5,x"), Err(ParseError::Malformed { .. })));
    assert!(matches!(parse_ship_list("0,0,5,h,1"), Err(ParseError::Malformed { .. })));
}

#[test]
fn chat_text_keeps_separators() {
    assert_eq!(
        Action::parse("ChatMessage|4:good game: rematch?|yes"),
        Ok(Action::Chat {
            game: 4,
            text: "good game: rematch?|yes".to_string()
        })
    );
    assert!(matches!(Action::parse("ChatMessage|hello"), Err(ParseError::Malformed { .. })));
}

#[test]
fn rejects_bad_frames() {
    assert_eq!(Action::parse(""), Err(ParseError::Empty));
    assert_eq!(Action::parse("   \r\n"), Err(ParseError::Empty));
    assert_eq!(Action::parse("dance|1"), Err(ParseError::UnknownAction("dance".to_string())));
    assert!(matches!(Action::parse("Attack|1|x|2"), Err(ParseError::Malformed { .. })));
    assert!(matches!(Action::parse("Attack|1|2"), Err(ParseError::Malformed { .. })));
    assert!(matches!(Action::parse("joinGame"), Err(ParseError::Malformed { .. })));
    assert!(matches!(Action::parse("Matchmaking|ranked"), Err(ParseError::Malformed { .. })));
    assert!(matches!(Action::parse("Hello|-1"), Err(ParseError::Malformed { .. })));
}

#[test]
fn encodes_events() {
    assert_eq!(Event::Welcome(7).encode(), "Welcome|7");
    assert_eq!(Event::YourTurn(3).encode(), "YourTurn|3");
    assert_eq!(Event::PlayerJoined { game: 3, user: 9 }.encode(), "PlayerJoined|3:9");
    assert_eq!(Event::GameOver("9".to_string()).encode(), "GameOver|9");
    assert_eq!(
        Event::UserStatus {
            user: 9,
            presence: Presence::Playing
        }
        .encode(),
        "UserStatus|9:Playing"
    );
    assert_eq!(
        Event::Chat {
            game: 3,
            from: 9,
            text: "hi: there".to_string()
        }
        .encode(),
        "ChatMessage|3:9:hi: there"
    );
    assert_eq!(Event::UnknownAction("dance".to_string()).to_string(), "UnknownAction|dance");
}

#[test]
fn shot_reports_are_json() {
    let frame = Event::AttackResult(ShotReport {
        x: 4,
        y: 2,
        result: ShotResult::Sunk,
    })
    .encode();
    let (name, payload) = frame.split_once('|').unwrap();
    assert_eq!(name, "AttackResult");
    let v: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(v["x"], 4);
    assert_eq!(v["y"], 2);
    assert_eq!(v["result"], "sunk");
}
