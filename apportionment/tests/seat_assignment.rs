use apportionment::builder::Builder;
use apportionment::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn input(seats: u32, votes: &[u32]) -> ApportionmentInput {
    ApportionmentInput {
        seats,
        political_groups: votes
            .iter()
            .enumerate()
            .map(|(idx, v)| PoliticalGroupVotes {
                number: idx as u32 + 1,
                votes: *v,
                candidate_count: None,
            })
            .collect(),
    }
}

fn input_with_candidates(seats: u32, votes: &[u32], candidates: &[u32]) -> ApportionmentInput {
    let mut res = input(seats, votes);
    for (pg, c) in res.political_groups.iter_mut().zip(candidates) {
        pg.candidate_count = Some(*c);
    }
    res
}

fn rules(tiebreak_mode: TieBreakMode) -> ApportionmentRules {
    ApportionmentRules {
        tiebreak_mode,
        ..ApportionmentRules::DEFAULT_RULES
    }
}

fn total_seats(seats: u32, votes: &[u32], rules: &ApportionmentRules) -> Vec<u32> {
    let res = seat_assignment(&input(seats, votes), rules);
    assert!(res.is_ok(), "{:?}", res);
    res.unwrap().total_seats()
}

// The properties that hold for every successful assignment.
fn check_invariants(input: &ApportionmentInput, res: &SeatAssignmentResult) {
    let n = input.political_groups.len();
    assert_eq!(res.seats, input.seats);
    assert_eq!(res.full_seats + res.residual_seats, res.seats);
    assert_eq!(res.total_seats().iter().sum::<u32>(), res.seats);
    assert_eq!(res.steps.len() as u32, res.residual_seats);
    assert_eq!(res.final_standing.len(), n);

    let mut previous: Option<&Vec<PoliticalGroupStanding>> = None;
    for (idx, step) in res.steps.iter().enumerate() {
        assert_eq!(step.residual_seat_number, idx as u32 + 1);
        assert_eq!(step.standings.len(), n);
        let residual: u32 = step.standings.iter().map(|s| s.residual_seats).sum();
        assert_eq!(residual, step.residual_seat_number);
        assert!(step.change.pg_options().contains(&step.change.selected_pg_number()));
        assert_eq!(step.change.pg_assigned()[0], step.change.selected_pg_number());
        for pg in step.change.pg_assigned() {
            assert!(step.change.pg_options().contains(pg));
        }
        for (i, s) in step.standings.iter().enumerate() {
            assert_eq!(s.pg_number, input.political_groups[i].number);
            assert_eq!(
                s.next_votes_per_seat,
                Fraction::new(s.votes_cast, s.total_seats() as u64 + 1)
            );
            assert_eq!(s.next_votes_per_seat.raw_numerator(), s.votes_cast);
            assert_eq!(s.next_votes_per_seat.denominator(), s.total_seats() as u64 + 1);
            if let Some(prev) = previous {
                assert_eq!(s.full_seats, prev[i].full_seats);
                assert!(s.residual_seats >= prev[i].residual_seats);
            }
        }
        previous = Some(&step.standings);
    }
}

#[test]
fn full_and_residual_seats() {
    init();
    let input = input(23, &[600, 302, 98, 99, 101]);
    let res = seat_assignment(&input, &ApportionmentRules::DEFAULT_RULES).unwrap();
    check_invariants(&input, &res);

    assert_eq!(res.quota.integer_part(), 52);
    assert_eq!(res.quota.fractional_numerator(), 4);
    assert_eq!(res.quota.denominator(), 23);
    assert_eq!(res.full_seats, 19);
    assert_eq!(res.residual_seats, 4);
    let full: Vec<u32> = res.final_standing.iter().map(|s| s.full_seats).collect();
    assert_eq!(full, vec![11, 5, 1, 1, 1]);

    let selected: Vec<u32> = res
        .steps
        .iter()
        .map(|s| s.change.selected_pg_number())
        .collect();
    assert_eq!(selected, vec![5, 2, 1, 4]);
    assert_eq!(res.total_seats(), vec![12, 6, 1, 2, 2]);

    // 101 / 2 is the highest average for the first residual seat.
    match &res.steps[0].change {
        SeatChange::LargestAverageAssignment(s) => {
            assert_eq!(s.votes_per_seat.raw_numerator(), 101);
            assert_eq!(s.votes_per_seat.denominator(), 2);
            assert_eq!(s.pg_options, vec![5]);
        }
        other => panic!("unexpected change {:?}", other),
    }
    // The standings are taken after the seat is assigned.
    let pg5 = &res.steps[0].standings[4];
    assert_eq!(pg5.residual_seats, 1);
    assert_eq!(pg5.next_votes_per_seat.denominator(), 3);

    let pg1 = res.standing_for(1).unwrap();
    assert_eq!(pg1.remainder_votes.raw_numerator(), 600);
    assert_eq!(pg1.remainder_votes.denominator(), 23);
}

#[test]
fn same_input_same_result() {
    init();
    let input = input(23, &[500, 140, 140, 140, 140, 140]);
    for mode in [
        TieBreakMode::PoliticalGroupOrder,
        TieBreakMode::MostVotes,
        TieBreakMode::Lots(1),
    ] {
        let a = seat_assignment(&input, &rules(mode)).unwrap();
        let b = seat_assignment(&input, &rules(mode)).unwrap();
        assert_eq!(a, b);
        check_invariants(&input, &a);
    }
}

#[test]
fn largest_remainders() {
    init();
    let r = ApportionmentRules::DEFAULT_RULES;
    assert_eq!(
        total_seats(15, &[540, 160, 160, 80, 80, 80, 60, 40], &r),
        vec![7, 2, 2, 1, 1, 1, 1, 0]
    );
    assert_eq!(
        total_seats(15, &[808, 59, 58, 57, 56, 55, 54, 53], &r),
        vec![12, 1, 1, 1, 0, 0, 0, 0]
    );
    assert_eq!(
        total_seats(15, &[480, 240, 240, 55, 50, 45, 45, 45], &r),
        vec![7, 4, 4, 0, 0, 0, 0, 0]
    );
    assert_eq!(
        total_seats(3, &[8, 7, 6, 5, 4, 3, 2, 1, 1, 1], &r),
        vec![1, 1, 1, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn unique_largest_average_after_remainders() {
    init();
    let input = input(10, &[0, 3, 5, 6, 7, 79]);
    let res = seat_assignment(&input, &ApportionmentRules::DEFAULT_RULES).unwrap();
    check_invariants(&input, &res);
    assert_eq!(res.total_seats(), vec![0, 0, 0, 0, 1, 9]);

    assert!(matches!(
        res.steps[0].change,
        SeatChange::LargestRemainderAssignment(LargestRemainderAssignedSeat {
            selected_pg_number: 6,
            ..
        })
    ));
    assert!(matches!(
        res.steps[1].change,
        SeatChange::UniqueLargestAverageAssignment(LargestAverageAssignedSeat {
            selected_pg_number: 6,
            ..
        })
    ));
    assert!(matches!(
        res.steps[2].change,
        SeatChange::UniqueLargestAverageAssignment(LargestAverageAssignedSeat {
            selected_pg_number: 5,
            ..
        })
    ));
}

#[test]
fn zero_votes_get_no_seat() {
    init();
    let input = input(10, &[0, 3, 5, 6, 7, 79]);
    let res = seat_assignment(&input, &ApportionmentRules::DEFAULT_RULES).unwrap();
    let pg1 = res.standing_for(1).unwrap();
    assert_eq!(pg1.full_seats, 0);
    assert_eq!(pg1.total_seats, 0);
    assert_eq!(pg1.remainder_votes, Fraction::ZERO);
    assert!(!pg1.meets_remainder_threshold);
    assert!(res.steps.iter().all(|s| s.change.selected_pg_number() != 1));
}

#[test]
fn tie_with_enough_seats() {
    init();
    // Five groups share the highest average and all of them get a seat.
    let input = input(24, &[7501, 1249, 1249, 1249, 1249, 1249, 1248, 7]);
    let res = seat_assignment(&input, &rules(TieBreakMode::Reject)).unwrap();
    check_invariants(&input, &res);
    assert_eq!(res.steps[0].change.pg_options(), &[2, 3, 4, 5, 6]);
    assert_eq!(res.steps[0].change.pg_assigned(), &[2, 3, 4, 5, 6]);
    assert_eq!(res.total_seats(), vec![12, 2, 2, 2, 2, 2, 2, 0]);
}

#[test]
fn tie_with_fewer_seats() {
    init();
    let input = input(23, &[500, 140, 140, 140, 140, 140]);

    let err = seat_assignment(&input, &rules(TieBreakMode::Reject)).unwrap_err();
    assert_eq!(
        err,
        ApportionmentError::DrawingOfLotsRequired {
            residual_seat_number: Some(2),
            pg_options: vec![2, 3, 4, 5, 6],
        }
    );

    let res = seat_assignment(&input, &rules(TieBreakMode::PoliticalGroupOrder)).unwrap();
    assert_eq!(res.steps[1].change.pg_options(), &[2, 3, 4, 5, 6]);
    assert_eq!(res.steps[1].change.pg_assigned(), &[2, 3, 4]);
    assert_eq!(res.total_seats(), vec![10, 3, 3, 3, 2, 2]);

    let res = seat_assignment(&input, &rules(TieBreakMode::Lots(1))).unwrap();
    assert_eq!(res.steps[1].change.pg_options(), &[2, 3, 4, 5, 6]);
    assert_eq!(res.steps[1].change.pg_assigned(), &[3, 5, 6]);
    assert_eq!(res.total_seats(), vec![10, 2, 3, 2, 3, 3]);
}

#[test]
fn absolute_majority_correction() {
    init();
    let votes = [2571, 977, 567, 536, 453];
    let without = total_seats(15, &votes, &ApportionmentRules::DEFAULT_RULES);
    assert_eq!(without, vec![7, 3, 2, 2, 1]);

    let r = ApportionmentRules {
        absolute_majority_correction: true,
        ..ApportionmentRules::DEFAULT_RULES
    };
    let input = input(15, &votes);
    let res = seat_assignment(&input, &r).unwrap();
    check_invariants(&input, &res);
    assert_eq!(res.total_seats(), vec![8, 3, 2, 1, 1]);
    assert_eq!(
        res.corrections,
        vec![SeatCorrection::AbsoluteMajorityReassignment {
            pg_retracted_seat: 4,
            pg_assigned_seat: 1,
        }]
    );
}

#[test]
fn absolute_majority_correction_with_tie() {
    init();
    let r = ApportionmentRules {
        absolute_majority_correction: true,
        ..rules(TieBreakMode::Reject)
    };
    let res = seat_assignment(
        &input(24, &[7501, 1249, 1249, 1249, 1249, 1249, 1248, 7]),
        &r,
    )
    .unwrap();
    assert_eq!(res.total_seats(), vec![13, 2, 2, 2, 2, 2, 1, 0]);

    let err = seat_assignment(
        &input(24, &[7501, 1249, 1249, 1249, 1249, 1248, 1248, 8]),
        &r,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ApportionmentError::DrawingOfLotsRequired {
            residual_seat_number: None,
            pg_options: vec![6, 7],
        }
    );
}

#[test]
fn seats_limited_to_candidates() {
    init();
    let r = ApportionmentRules {
        limit_seats_to_candidates: true,
        ..ApportionmentRules::DEFAULT_RULES
    };
    let cases: [(u32, &[u32], &[u32], &[u32]); 3] = [
        (8, &[537, 10, 426], &[2, 1, 6], &[2, 1, 5]),
        (
            19,
            &[1599, 1598, 1598, 1598, 1002],
            &[5, 5, 5, 5, 2],
            &[5, 4, 4, 4, 2],
        ),
        (
            10,
            &[0, 3, 5, 6, 7, 79],
            &[1, 1, 1, 1, 1, 8],
            &[0, 0, 0, 1, 1, 8],
        ),
    ];
    for (seats, votes, candidates, expected) in cases {
        let input = input_with_candidates(seats, votes, candidates);
        let res = seat_assignment(&input, &r).unwrap();
        check_invariants(&input, &res);
        assert_eq!(res.total_seats(), expected.to_vec());
        for (pg, c) in res.final_standing.iter().zip(candidates) {
            assert!(pg.total_seats <= *c);
        }
    }
}

#[test]
fn remainders_fall_back_to_largest_averages() {
    init();
    let r = ApportionmentRules {
        limit_seats_to_candidates: true,
        ..ApportionmentRules::DEFAULT_RULES
    };
    let input = input_with_candidates(6, &[5, 5, 50], &[2, 2, 2]);
    let res = seat_assignment(&input, &r).unwrap();
    check_invariants(&input, &res);
    assert_eq!(res.total_seats(), vec![2, 2, 2]);
    assert_eq!(res.steps.len(), 4);
    assert!(matches!(
        res.steps[0].change,
        SeatChange::UniqueLargestAverageAssignment(_)
    ));
    assert!(matches!(
        res.steps[1].change,
        SeatChange::UniqueLargestAverageAssignment(_)
    ));
    assert!(matches!(
        res.steps[2].change,
        SeatChange::LargestAverageAssignment(_)
    ));
    assert!(matches!(
        res.steps[3].change,
        SeatChange::LargestAverageAssignment(_)
    ));
}

#[test]
fn no_correction_when_majority_list_is_exhausted() {
    init();
    let input = input_with_candidates(
        24,
        &[7501, 1249, 1249, 1249, 1249, 1249, 1248, 7],
        &[12, 2, 2, 2, 2, 2, 2, 1],
    );
    let res = seat_assignment(&input, &ApportionmentRules::DUTCH_MUNICIPAL).unwrap();
    check_invariants(&input, &res);
    assert_eq!(res.total_seats(), vec![12, 2, 2, 2, 2, 2, 2, 0]);
    assert!(res.corrections.is_empty());
}

#[test]
fn no_eligible_group() {
    init();
    let r = ApportionmentRules {
        limit_seats_to_candidates: true,
        ..ApportionmentRules::DEFAULT_RULES
    };
    let err = seat_assignment(&input_with_candidates(5, &[10, 10], &[1, 3]), &r).unwrap_err();
    match err {
        ApportionmentError::NoEligiblePoliticalGroup {
            residual_seat_number,
            standings,
        } => {
            assert_eq!(residual_seat_number, 2);
            assert_eq!(standings.len(), 2);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn invalid_inputs() {
    init();
    let r = ApportionmentRules::DEFAULT_RULES;
    assert_eq!(
        seat_assignment(&input(0, &[1, 2]), &r).unwrap_err(),
        ApportionmentError::ZeroSeats
    );
    assert_eq!(
        seat_assignment(&input(3, &[]), &r).unwrap_err(),
        ApportionmentError::NoPoliticalGroups
    );
    assert_eq!(
        seat_assignment(&input(3, &[0, 0]), &r).unwrap_err(),
        ApportionmentError::ZeroVotes
    );
}

#[test]
fn builder_runs_the_assignment() {
    init();
    let mut builder = Builder::new(&ApportionmentRules::DEFAULT_RULES)
        .unwrap()
        .seats(23)
        .unwrap();
    for (number, votes) in [(1, 600), (2, 302), (3, 98), (4, 99), (5, 101)] {
        builder.add_political_group(number, votes).unwrap();
    }
    assert_eq!(
        builder.add_political_group(3, 1),
        Err(ApportionmentError::DuplicatePoliticalGroup { pg_number: 3 })
    );
    assert_eq!(builder.build(), input(23, &[600, 302, 98, 99, 101]));
    let res = builder.seat_assignment().unwrap();
    assert_eq!(res.total_seats(), vec![12, 6, 1, 2, 2]);
}

#[test]
fn builder_with_candidate_counts() {
    init();
    let r = ApportionmentRules {
        limit_seats_to_candidates: true,
        ..ApportionmentRules::DEFAULT_RULES
    };
    let mut builder = Builder::new(&r).unwrap().seats(8).unwrap();
    for (number, votes, candidates) in [(1, 537, 2), (2, 10, 1), (3, 426, 6)] {
        builder
            .add_political_group_with_candidates(number, votes, candidates)
            .unwrap();
    }
    assert_eq!(
        builder.build(),
        input_with_candidates(8, &[537, 10, 426], &[2, 1, 6])
    );
    let res = builder.seat_assignment().unwrap();
    assert_eq!(res.total_seats(), vec![2, 1, 5]);
}

#[test]
fn serialized_result() {
    init();
    let res = seat_assignment(
        &input(23, &[600, 302, 98, 99, 101]),
        &ApportionmentRules::DEFAULT_RULES,
    )
    .unwrap();
    let js = serde_json::to_value(&res).unwrap();
    assert_eq!(
        js["quota"],
        serde_json::json!({"integer": 52, "numerator": 4, "denominator": 23})
    );
    assert_eq!(js["steps"][0]["change"]["changed_by"], "LargestAverageAssignment");
    assert_eq!(js["steps"][0]["change"]["selected_pg_number"], 5);
    assert!(js.get("corrections").is_none());
    let back: SeatAssignmentResult = serde_json::from_value(js).unwrap();
    assert_eq!(back, res);
}
