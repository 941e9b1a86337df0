use broadside::{
    fleet_cells, Board, BoardError, CellStatus, Orientation, PlacementIssue, Ship, ShotResult, BOARD_SIZE, NUM_SHIPS,
};
use rand::{rngs::SmallRng, SeedableRng};

#[test]
fn two_ships_hit_sink_and_fleet_gone() {
    let mut board = Board::new();
    board.place_ship(Ship::new("Destroyer", 0, 0, 2, Orientation::Horizontal)).unwrap();
    board.place_ship(Ship::new("Cruiser", 3, 3, 3, Orientation::Vertical)).unwrap();

    assert_eq!(board.resolve_shot(0, 0).unwrap(), ShotResult::Hit);
    assert_eq!(board.resolve_shot(1, 0).unwrap(), ShotResult::Sunk);
    assert!(!board.all_ships_sunk());

    assert_eq!(board.resolve_shot(3, 3).unwrap(), ShotResult::Hit);
    assert_eq!(board.resolve_shot(3, 4).unwrap(), ShotResult::Hit);
    assert_eq!(board.resolve_shot(3, 5).unwrap(), ShotResult::Sunk);
    assert!(board.all_ships_sunk());
}

#[test]
fn second_shot_at_same_cell_is_rejected() {
    let mut board = Board::new();
    board.place_ship(Ship::new("Destroyer", 0, 0, 2, Orientation::Horizontal)).unwrap();

    assert_eq!(board.resolve_shot(5, 5).unwrap(), ShotResult::Miss);
    assert_eq!(board.resolve_shot(5, 5), Err(BoardError::AlreadyAttacked { x: 5, y: 5 }));
    assert_eq!(board.shot_count(), 1);

    assert_eq!(board.resolve_shot(0, 0).unwrap(), ShotResult::Hit);
    assert_eq!(board.resolve_shot(0, 0), Err(BoardError::AlreadyAttacked { x: 0, y: 0 }));
    assert_eq!(board.ships()[0].hits().count(), 1);
}

#[test]
fn out_of_bounds_shot() {
    let mut board = Board::new();
    assert_eq!(board.resolve_shot(BOARD_SIZE, 0), Err(BoardError::OutOfBounds { x: 10, y: 0 }));
    assert_eq!(board.resolve_shot(0, 200), Err(BoardError::OutOfBounds { x: 0, y: 200 }));
    assert_eq!(board.shot_count(), 0);
}

#[test]
fn overlapping_placement_leaves_board_untouched() {
    let mut board = Board::new();
    board.place_ship(Ship::new("Carrier", 2, 2, 5, Orientation::Horizontal)).unwrap();
    let before = board.clone();

    let err = board
        .place_ship(Ship::new("Cruiser", 4, 0, 3, Orientation::Vertical))
        .unwrap_err();
    assert_eq!(
        err,
        BoardError::InvalidPlacement {
            ship: "Cruiser".to_string(),
            issue: PlacementIssue::Overlaps,
        }
    );
    assert_eq!(board, before);
    assert_eq!(board.occupied_count(), 5);
}

#[test]
fn placement_running_off_the_board() {
    let mut board = Board::new();
    let err = board
        .place_ship(Ship::new("Carrier", 8, 0, 5, Orientation::Horizontal))
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::InvalidPlacement {
            issue: PlacementIssue::OutOfBounds,
            ..
        }
    ));
    let err = board
        .place_ship(Ship::new("Carrier", 0, 250, 5, Orientation::Vertical))
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::InvalidPlacement {
            issue: PlacementIssue::OutOfBounds,
            ..
        }
    ));
    assert!(!board.has_fleet());
}

#[test]
fn empty_ship_is_rejected() {
    let mut board = Board::new();
    let err = board.place_ship(Ship::new("Nothing", 0, 0, 0, Orientation::Horizontal)).unwrap_err();
    assert!(matches!(
        err,
        BoardError::InvalidPlacement {
            issue: PlacementIssue::Empty,
            ..
        }
    ));
}

#[test]
fn random_fleet_places_standard_ships() {
    let mut rng = SmallRng::seed_from_u64(42);
    let board = Board::random_fleet(&mut rng).unwrap();
    assert_eq!(board.ships().len(), NUM_SHIPS);
    assert_eq!(board.occupied_count(), fleet_cells());
    assert_eq!(fleet_cells(), 17);
    let names: Vec<&str> = board.ships().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["Carrier", "Battleship", "Cruiser", "Submarine", "Destroyer"]);
}

#[test]
fn cell_status_follows_shots() {
    let mut board = Board::new();
    board.place_ship(Ship::new("Destroyer", 4, 4, 2, Orientation::Vertical)).unwrap();
    board.resolve_shot(4, 5).unwrap();
    board.resolve_shot(0, 9).unwrap();

    assert_eq!(board.cell(4, 5).unwrap().status(), CellStatus::Hit);
    assert_eq!(board.cell(0, 9).unwrap().status(), CellStatus::Miss);
    assert_eq!(board.cell(4, 4).unwrap().status(), CellStatus::Empty);
    assert!(board.cell(4, 4).unwrap().has_ship);
    assert!(board.cell(10, 0).is_none());
    assert_eq!(board.cells().count(), 100);
    assert_eq!(board.unattacked().len(), 98);
}

#[test]
fn orientation_parsing() {
    assert_eq!(Orientation::parse("h"), Some(Orientation::Horizontal));
    assert_eq!(Orientation::parse("Horizontal"), Some(Orientation::Horizontal));
    assert_eq!(Orientation::parse("V"), Some(Orientation::Vertical));
    assert_eq!(Orientation::parse("vertical"), Some(Orientation::Vertical));
    assert_eq!(Orientation::parse("diagonal"), None);
}

#[test]
fn ship_lays_out_again_from_its_placement() {
    let ship = Ship::new("Battleship", 6, 1, 4, Orientation::Vertical);
    let placement = ship.placement();
    assert_eq!((placement.x, placement.y, placement.size), (6, 1, 4));
    assert_eq!(placement.orientation, Orientation::Vertical);
    assert_eq!(Ship::from_placement("Battleship", &placement), ship);
}
