//! Cross-checks between breadth-first search and the SAT horizon driver

use ice_push_planner::config::{PushModel, SolverBackend};
use ice_push_planner::world::{Cell, Direction, Grid, Level, Simulator};
use ice_push_planner::{PlanError, PlanningProblem, Settings};

const LEVELS: [&str; 9] = [
    "S.#\n.G.\n.#.\n",
    "S.BG.\n",
    "S...#\n.B...\n...#.\n#...G\n",
    "S.B...\n......\n#....G\n",
    "S..#\n....\n.#..\n..G.\n",
    "SBB..#G\n",
    "S.B.B#\n.....G\n",
    "S.BBG..\n",
    "S.BG.B..\n",
];

fn settings(push_model: PushModel, bound: usize) -> Settings {
    let mut settings = Settings::default();
    settings.planning.push_model = push_model;
    settings.planning.max_horizon = bound;
    settings.search.depth_limit = bound;
    settings
}

fn problem(map: &str, settings: Settings) -> PlanningProblem {
    PlanningProblem::with_level(settings, Level::parse(map).unwrap()).unwrap()
}

#[test]
fn engines_agree_on_shortest_length() {
    for push_model in [PushModel::Chain, PushModel::Slide] {
        for map in LEVELS {
            let report = problem(map, settings(push_model, 8)).compare();

            match (&report.search.result, &report.sat.result) {
                (Ok(bfs), Ok(sat)) => {
                    assert_eq!(bfs.moves(), sat.moves(), "{:?} on\n{}", push_model, map)
                }
                (Err(a), Err(b)) => {
                    assert!(a.is_no_solution() && b.is_no_solution(), "{:?} on\n{}", push_model, map)
                }
                (a, b) => panic!("engines disagree on\n{}: {:?} vs {:?}", map, a, b),
            }
        }
    }
}

#[test]
fn plans_replay_to_goal() {
    for push_model in [PushModel::Chain, PushModel::Slide] {
        for map in LEVELS {
            let problem = problem(map, settings(push_model, 8));
            let level = problem.level();
            let sim = Simulator::new(&level.grid, push_model);

            for run in [problem.run_search(), problem.run_sat()] {
                let Some(plan) = run.plan() else { continue };
                let replayed = sim.replay(&level.initial_configuration(), &plan.trajectory.moves);
                assert_eq!(replayed, plan.trajectory.states);
                assert_eq!(plan.trajectory.last().robot, level.goal);
            }
        }
    }
}

#[test]
fn varisat_backend_matches_search() {
    let mut settings = settings(PushModel::Chain, 8);
    settings.solver.backend = SolverBackend::Varisat;

    for map in LEVELS {
        let report = problem(map, settings.clone()).compare();
        assert_ne!(report.moves_agree(), Some(false), "disagreement on\n{}", map);
    }
}

#[test]
fn parallel_driver_matches_sequential() {
    let mut parallel = settings(PushModel::Chain, 8);
    parallel.solver.parallel.enabled = true;
    parallel.solver.parallel.threads = 4;

    for map in LEVELS {
        let sequential = problem(map, settings(PushModel::Chain, 8)).solve_with_sat();
        let concurrent = problem(map, parallel.clone()).solve_with_sat();
        assert_eq!(sequential.map(|p| p.moves()), concurrent.map(|p| p.moves()));
    }
}

#[test]
fn walled_level_needs_two_moves() {
    let plan = problem("S.#\n.G.\n.#.\n", settings(PushModel::Chain, 4))
        .solve_with_sat()
        .unwrap();
    assert_eq!(plan.trajectory.moves, vec![Direction::Right, Direction::Down]);
}

#[test]
fn open_room_center_is_unreachable() {
    let problem = problem("S..\n.G.\n...\n", settings(PushModel::Chain, 4));

    assert_eq!(problem.solve_with_search().unwrap_err(), PlanError::NoSolution { bound: 4 });
    assert_eq!(problem.solve_with_sat().unwrap_err(), PlanError::NoSolution { bound: 4 });
}

#[test]
fn pushed_box_creates_a_stop() {
    let chain = problem("S.BG.\n", settings(PushModel::Chain, 4));
    let plan = chain.solve_with_sat().unwrap();
    assert_eq!(plan.trajectory.moves, vec![Direction::Right, Direction::Right]);
    assert_eq!(plan.trajectory.last().boxes, vec![Cell::new(0, 4)]);

    let slide = problem("S.BG.\n", settings(PushModel::Slide, 4));
    let plan = slide.solve_with_search().unwrap();
    assert_eq!(plan.trajectory.moves, vec![Direction::Right]);
    assert_eq!(plan.trajectory.last().boxes, vec![Cell::new(0, 4)]);
}

#[test]
fn start_on_goal_needs_no_moves() {
    let level = Level::new(Grid::new(3, 3), Cell::new(1, 1), Cell::new(1, 1), vec![Cell::new(0, 0)]);
    let problem = PlanningProblem::with_level(settings(PushModel::Chain, 4), level).unwrap();

    assert_eq!(problem.solve_with_search().unwrap().moves(), 0);
    assert_eq!(problem.solve_with_sat().unwrap().moves(), 0);
}

#[test]
fn box_run_shifts_as_a_chain() {
    let level = "S.BBG..\n";

    let chain = problem(level, settings(PushModel::Chain, 6));
    for plan in [chain.solve_with_search().unwrap(), chain.solve_with_sat().unwrap()] {
        assert_eq!(plan.trajectory.moves, vec![Direction::Right; 3]);
        assert_eq!(plan.trajectory.last().boxes, vec![Cell::new(0, 5), Cell::new(0, 6)]);
    }

    // The first box is wedged against the second and never moves
    let slide = problem(level, settings(PushModel::Slide, 6));
    assert_eq!(slide.solve_with_search().unwrap_err(), PlanError::NoSolution { bound: 6 });
    assert_eq!(slide.solve_with_sat().unwrap_err(), PlanError::NoSolution { bound: 6 });
}

#[test]
fn sliding_box_stops_against_another_box() {
    let level = "S.BG.B..\n";
    let stopped = vec![Cell::new(0, 4), Cell::new(0, 5)];

    let slide = problem(level, settings(PushModel::Slide, 6));
    for plan in [slide.solve_with_search().unwrap(), slide.solve_with_sat().unwrap()] {
        assert_eq!(plan.trajectory.moves, vec![Direction::Right]);
        assert_eq!(plan.trajectory.last().boxes, stopped);
    }

    let chain = problem(level, settings(PushModel::Chain, 6));
    for plan in [chain.solve_with_search().unwrap(), chain.solve_with_sat().unwrap()] {
        assert_eq!(plan.trajectory.moves, vec![Direction::Right, Direction::Right]);
        assert_eq!(plan.trajectory.last().boxes, stopped);
    }
}

#[test]
fn two_box_level_with_open_lane() {
    for push_model in [PushModel::Chain, PushModel::Slide] {
        let problem = problem("S.B.B#\n.....G\n", settings(push_model, 6));
        let plan = problem.solve_with_sat().unwrap();

        assert_eq!(plan.trajectory.moves, vec![Direction::Down, Direction::Right]);
        assert_eq!(plan.trajectory.last().boxes, vec![Cell::new(0, 2), Cell::new(0, 4)]);
        assert_eq!(problem.solve_with_search().unwrap().moves(), 2);
    }
}
