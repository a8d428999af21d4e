/*!

This is the long-form manual for `apportionment` and the `apportion` program.

## Method

The quota is the total number of votes divided by the number of seats. Every
political group first gets one full seat for each whole quota of votes. What is
left of its votes after the full seats is its remainder.

The seats left after the full seats are the residual seats. They are assigned
one at a time, with one of two methods:

- **largest averages** (D'Hondt): the seat goes to the group with the highest
  average number of votes per seat, counting the seat being assigned.
- **largest remainders**: first to the largest remainders, for the groups whose
  votes reach the remainder threshold (three quarters of the quota by default),
  at most one seat per group. Then to the highest averages, at most one seat per
  group. If seats are still left, to the highest averages without restriction.

By default, the largest averages are used from 19 seats on, and the largest
remainders below.

All the numbers are exact fractions. In the output they are written as
`{"integer": 52, "numerator": 4, "denominator": 23}` for `52 4/23`. The
denominator is kept as computed: the number of seats for the quota and the
remainders, and the number of seats plus one for the averages.

## Ties

When several groups share the highest value, all of them are listed in
`pg_options`. If there are enough residual seats left for all of them, they
all get one (`pg_assigned` is the same as `pg_options`). Otherwise the
tie-break decides which of them are in `pg_assigned`:

- `drawingOfLots`: the program stops and reports the groups. The lots have to be
  drawn by the electoral body.
- `politicalGroupOrder`: the order of the groups in the input.
- `mostVotes`: the groups with the most votes first.
- `random`: a reproducible drawing based on the `randomSeed` option. The
  same seed always gives the same result.

## Input formats

### `abacus`

Two JSON files in the format of the Abacus election software:

- the election, with `number_of_seats` and the `political_groups`, each with
  its `number` and its list of `candidates`.
- the election summary, with `votes_counts.votes_candidates_count` and the
  `political_group_votes`, each with its `number`, its `total` and the
  `candidate_votes`.

The total of every group must match the sum of the votes of its candidates,
and the sum of the totals must match `votes_candidates_count`.

### Command line

The seats and the votes can also be given directly:

```text
apportion --seats 23 --votes 600 302 98 99 101
```

The political groups are then numbered from 1 in the order of the votes.

## Configuration

`apportion` comes with the rules of the Dutch municipal elections, but other
rules can be set in a configuration file in JSON:

```text
{
  "outputSettings": { "electionName": "Municipal council", "outputFile": "result.json" },
  "sources": {
    "provider": "abacus",
    "electionFile": "election.json",
    "summaryFile": "summary.json"
  },
  "rules": {
    "residualSeatMethod": "bySeatCount",
    "minimumSeatsForAverages": 19,
    "remainderThreshold": "3/4",
    "tiebreakMode": "drawingOfLots",
    "absoluteMajorityCorrection": true,
    "limitSeatsToCandidates": true
  }
}
```

The relative paths are read from the directory of the configuration file.

Rules:
- `residualSeatMethod` (string, optional): `bySeatCount` (default),
  `largestAverages` or `largestRemainders`.
- `minimumSeatsForAverages` (number, optional, default 19): for `bySeatCount`.
- `remainderThreshold` (string, optional, default `3/4`).
- `tiebreakMode` (string, optional): `drawingOfLots` (default),
  `politicalGroupOrder`, `mostVotes` or `random`.
- `randomSeed` (string or number, required for `random`).
- `absoluteMajorityCorrection` (boolean, optional, default true): a group with
  more than half of the votes but not more than half of the seats gets the last
  residual seat of another group.
- `limitSeatsToCandidates` (boolean, optional, default true): a group cannot
  get more seats than it has candidates. Its extra seats go to the other groups.

 */
