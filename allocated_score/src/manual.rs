/*!

This is the long-form manual for `allocated_score` and `startab`.

## The method

Allocated Score (also called STAR-PR) is a proportional method for electing several
winners from score ballots. Each voter gives every candidate a score from 0 to 5.

Every ballot starts with a weight of 1. The quota is the number of valid ballots divided by
the number of seats. Each round:

1. The scores of every ballot are multiplied by the weight of the ballot and summed for each
   candidate still running.
2. The candidate with the highest sum is elected.
3. The ballots that supported the winner the most pay for that seat. Going down from the
   strongest supporters, ballots are spent until their cumulative weight makes a full quota.
   The ballots strictly above the split point lose all their weight. The ballots exactly on
   the split point lose the fraction of their weight that completes the quota.

The election stops as soon as all the seats are filled.

### Ties

When several candidates share the highest sum, all of them are reported in the `tied`
entry of that round. The winner is then chosen:
- if the five-star tiebreaker is enabled, among the tied candidates with the most ballots
  giving them 5;
- then, in `useCandidateOrder` mode, the candidate listed first;
- or, in `random` mode, uniformly at random using a ChaCha20 generator seeded with the
  `randomSeed` of the configuration. The same seed always gives the same result.

## Input formats

### `csv`

Each row is a ballot, each column from `firstVoteColumnIndex` is a candidate.
The first row holds the names of the candidates.

```text
id,Alice,Bob,Charlie
v1,5,3,
v2,0,5,4
```

Blank cells count as 0. A ballot where every cell is blank is an undervote. A ballot with
a cell that is not an integer between 0 and 5 is invalid. Both are reported in the summary
and take no part in the tabulation.

### `xlsx`

Same layout as `csv`, in the first worksheet of an Excel file (or the worksheet given with
`--excel-worksheet-name`).

## Configuration

```json
{
  "outputSettings": { "contestName": "City council" },
  "cvrFileSources": [
    { "provider": "csv", "filePath": "ballots.csv", "firstVoteColumnIndex": 2, "firstVoteRowIndex": 2 }
  ],
  "candidates": [ { "name": "Alice" }, { "name": "Bob" }, { "name": "Charlie" } ],
  "rules": { "numberOfWinners": 2, "tiebreakMode": "random", "randomSeed": "42", "fiveStarTiebreaker": true }
}
```

*/
